// src/main.rs

use anyhow::Context;
use log::{error, info, warn};

use dockbar::bar;
use dockbar::config::Config;
use dockbar::render_loop::StopHandle;
use dockbar::signals;

/// Main entry point for the `dockbar` binary.
fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting dockbar {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().context("Failed to load configuration")?;
    info!(
        "Configuration: {}mm at the {:?} edge, every {}ms",
        config.bar.height_mm, config.bar.edge, config.render.interval_ms
    );

    let stop = StopHandle::default();
    let watcher = match signals::install() {
        Ok(()) => Some(signals::watch(stop.clone()).context("Failed to start signal watcher")?),
        Err(e) => {
            warn!("Signal handling unavailable ({}); Ctrl-C will not exit cleanly", e);
            None
        }
    };

    let result = bar::run_until(config, stop.clone());

    // Lets the watcher thread finish if no signal arrived.
    stop.request_stop();
    if let Some(watcher) = watcher {
        if watcher.join().is_err() {
            warn!("Signal watcher thread panicked");
        }
    }

    match result {
        Ok(()) => {
            info!("dockbar exited successfully.");
            Ok(())
        }
        Err(e) => {
            error!("dockbar stopped: {:#}", e);
            Err(e)
        }
    }
}
