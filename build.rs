// build.rs

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // The bar talks to the X server through Xlib and reads the monitor
    // layout through the RandR extension. Prefer pkg-config; fall back to
    // plain link flags when it is unavailable or the .pc files are missing.
    let libraries = ["x11", "xrandr"];

    let mut pkg_config_success = true;
    for lib in &libraries {
        if pkg_config::probe_library(lib).is_err() {
            eprintln!(
                "pkg-config failed for library '{}'. Falling back to manual linking.",
                lib
            );
            pkg_config_success = false;
            break;
        }
    }

    if !pkg_config_success {
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-lib=Xrandr");
        println!("cargo:rustc-link-search=/usr/lib");
        eprintln!(
            "Manual linking flags applied. Ensure the X11 and Xrandr development libraries are installed."
        );
    } else {
        eprintln!("pkg-config successfully found libraries. Linking configured automatically.");
    }
}
