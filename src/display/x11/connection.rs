// src/display/x11/connection.rs

use log::{debug, info, warn};
use std::ptr;

use libc::c_int;
use x11::xlib;

use super::errors;
use crate::display::{c_string, DisplayError};

/// Owns the raw `*mut xlib::Display`, closing it on drop.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    /// Opens the display named by `DISPLAY`.
    fn open() -> Result<Self, DisplayError> {
        let display_ptr = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display_ptr.is_null() {
            Err(DisplayError::OpenDisplay)
        } else {
            debug!("X11: display opened: {:p}", display_ptr);
            Ok(Self { ptr: display_ptr })
        }
    }

    #[inline]
    fn raw(&self) -> *mut xlib::Display {
        self.ptr
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            info!("X11: closing display connection {:p}", self.ptr);
            unsafe {
                let status = xlib::XCloseDisplay(self.ptr);
                if status != 0 {
                    warn!(
                        "XCloseDisplay returned non-zero status: {}. Display may not have closed cleanly.",
                        status
                    );
                }
            }
        }
    }
}

/// Connection to the X server, shared by the render and event threads.
///
/// Holds the display together with the default screen's root window, visual
/// and depth. Opening the connection first enables Xlib's thread support and
/// installs the error trap from `errors`.
#[derive(Debug)]
pub struct Connection {
    managed_display: ManagedDisplay,
    screen: c_int,
    root: xlib::Window,
    visual: *mut xlib::Visual,
    depth: c_int,
}

// SAFETY: XInitThreads is called before the display is opened, so Xlib
// serialises access to it internally. The visual pointer is owned by the
// display and only read.
unsafe impl Send for Connection {}
unsafe impl Sync for Connection {}

impl Connection {
    pub fn open() -> Result<Self, DisplayError> {
        info!("X11: establishing server connection");
        unsafe {
            if xlib::XInitThreads() == 0 {
                return Err(DisplayError::InitThreads);
            }
        }
        errors::install();

        let managed_display = ManagedDisplay::open()?;
        let display = managed_display.raw();

        let (screen, root, visual, depth) = unsafe {
            let screen = xlib::XDefaultScreen(display);
            (
                screen,
                xlib::XRootWindow(display, screen),
                xlib::XDefaultVisual(display, screen),
                xlib::XDefaultDepth(display, screen),
            )
        };
        if visual.is_null() {
            // ManagedDisplay's Drop closes the display.
            return Err(DisplayError::Query {
                call: "XDefaultVisual",
                id: screen as u64,
            });
        }
        debug!(
            "X11: screen {} root {:#x} depth {} visual {:p}",
            screen, root, depth, visual
        );

        info!("X11: server connection established");
        Ok(Connection {
            managed_display,
            screen,
            root,
            visual,
            depth,
        })
    }

    /// Raw display pointer; valid for as long as `self` is alive.
    #[inline]
    pub fn display(&self) -> *mut xlib::Display {
        self.managed_display.raw()
    }

    #[inline]
    pub fn screen(&self) -> c_int {
        self.screen
    }

    #[inline]
    pub fn root(&self) -> xlib::Window {
        self.root
    }

    #[inline]
    pub fn visual(&self) -> *mut xlib::Visual {
        self.visual
    }

    #[inline]
    pub fn depth(&self) -> c_int {
        self.depth
    }

    /// Root window size in pixels.
    pub fn root_size(&self) -> (u32, u32) {
        unsafe {
            let width = xlib::XDisplayWidth(self.display(), self.screen);
            let height = xlib::XDisplayHeight(self.display(), self.screen);
            (width.max(0) as u32, height.max(0) as u32)
        }
    }

    pub fn intern_atom(&self, name: &str) -> Result<xlib::Atom, DisplayError> {
        let c_name = c_string("atom name", name)?;
        let atom = unsafe { xlib::XInternAtom(self.display(), c_name.as_ptr(), xlib::False) };
        if atom == 0 {
            return Err(DisplayError::Query {
                call: "XInternAtom",
                id: 0,
            });
        }
        Ok(atom)
    }

    /// Round-trips to the server and reports any protocol error raised since
    /// the previous check, attributed to `call`.
    pub fn check(&self, call: &'static str) -> Result<(), DisplayError> {
        unsafe {
            xlib::XSync(self.display(), xlib::False);
        }
        match errors::take() {
            Some(trapped) => Err(DisplayError::Protocol {
                call,
                code: trapped.code,
                request: trapped.request,
            }),
            None => Ok(()),
        }
    }

    pub fn flush(&self) {
        unsafe {
            xlib::XFlush(self.display());
        }
    }
}
