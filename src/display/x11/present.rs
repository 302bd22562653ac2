// src/display/x11/present.rs

use log::trace;
use std::ptr;
use std::sync::Arc;

use libc::{c_char, c_uint};
use x11::xlib;

use super::DockWindow;
use crate::canvas::Canvas;
use crate::display::{DisplayError, Presenter};

/// Copies finished canvases into the dock window with `XPutImage`.
pub struct X11Presenter {
    window: Arc<DockWindow>,
}

impl X11Presenter {
    pub fn new(window: Arc<DockWindow>) -> Self {
        X11Presenter { window }
    }
}

impl Presenter for X11Presenter {
    fn present(&mut self, canvas: &Canvas) -> Result<(), DisplayError> {
        let (width, height) = (canvas.width(), canvas.height());
        if (width, height) != self.window.size() {
            return Err(DisplayError::Geometry(format!(
                "canvas {}x{} does not match window {:?}",
                width,
                height,
                self.window.size()
            )));
        }
        let conn = self.window.connection();

        unsafe {
            // The image borrows the canvas pixels; ownership is never handed
            // to Xlib.
            let image = xlib::XCreateImage(
                conn.display(),
                conn.visual(),
                conn.depth() as c_uint,
                xlib::ZPixmap,
                0,
                canvas.pixels().as_ptr() as *mut c_char,
                width,
                height,
                32,
                0,
            );
            if image.is_null() {
                return Err(DisplayError::CreateImage { width, height });
            }

            xlib::XPutImage(
                conn.display(),
                self.window.id(),
                self.window.gc(),
                image,
                0,
                0,
                0,
                0,
                width,
                height,
            );

            // Keep XDestroyImage from freeing the canvas buffer.
            (*image).data = ptr::null_mut();
            xlib::XDestroyImage(image);
        }
        conn.check("XPutImage")?;
        trace!("X11: presented {}x{} frame", width, height);
        Ok(())
    }
}
