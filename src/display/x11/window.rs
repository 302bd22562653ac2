// src/display/x11/window.rs

use log::{debug, info, trace, warn};
use std::mem;
use std::ptr;
use std::sync::Arc;

use libc::{c_int, c_long, c_uchar, c_uint, c_ulong};
use x11::xlib;

use super::Connection;
use crate::color::Color;
use crate::display::{c_string, DisplayError};
use crate::geometry::{BarGeometry, Strut};

/// `_NET_WM_STATE` client message action.
const NET_WM_STATE_ADD: c_long = 1;
/// Source indication for EWMH requests: a normal application.
const SOURCE_APPLICATION: c_long = 1;

/// The bar's top-level window and its graphics context.
///
/// Destroyed on drop; must be dropped before the last `Arc<Connection>`,
/// which it keeps alive itself.
#[derive(Debug)]
pub struct DockWindow {
    conn: Arc<Connection>,
    id: xlib::Window,
    gc: xlib::GC,
    width: u32,
    height: u32,
}

// SAFETY: the GC handle is only used through the thread-safe display
// (XInitThreads runs before the connection opens).
unsafe impl Send for DockWindow {}
unsafe impl Sync for DockWindow {}

impl DockWindow {
    /// Creates the (unmapped) window at `geometry` and lowers it below its
    /// siblings.
    pub fn create(
        conn: Arc<Connection>,
        geometry: &BarGeometry,
        background: Color,
    ) -> Result<Self, DisplayError> {
        info!(
            "X11: creating dock window {}x{}+{}+{}",
            geometry.width, geometry.height, geometry.x, geometry.y
        );
        let display = conn.display();

        let id = unsafe {
            let mut attributes: xlib::XSetWindowAttributes = mem::zeroed();
            attributes.background_pixel = c_ulong::from(background.to_pixel());
            attributes.border_pixel = 0;
            attributes.event_mask = xlib::ExposureMask | xlib::StructureNotifyMask;
            let value_mask = xlib::CWBackPixel | xlib::CWBorderPixel | xlib::CWEventMask;

            xlib::XCreateWindow(
                display,
                conn.root(),
                geometry.x as c_int,
                geometry.y as c_int,
                geometry.width as c_uint,
                geometry.height as c_uint,
                0,
                conn.depth(),
                xlib::InputOutput as c_uint,
                conn.visual(),
                value_mask,
                &mut attributes,
            )
        };
        conn.check("XCreateWindow")?;
        if id == 0 {
            return Err(DisplayError::Query {
                call: "XCreateWindow",
                id: conn.root(),
            });
        }

        let gc = unsafe { xlib::XCreateGC(display, id, 0, ptr::null_mut()) };
        if gc.is_null() {
            unsafe { xlib::XDestroyWindow(display, id) };
            return Err(DisplayError::Query {
                call: "XCreateGC",
                id,
            });
        }
        let window = DockWindow {
            conn,
            id,
            gc,
            width: geometry.width,
            height: geometry.height,
        };

        unsafe { xlib::XLowerWindow(display, id) };
        window.conn.check("XLowerWindow")?;
        debug!("X11: window {:#x} created and lowered", id);
        Ok(window)
    }

    pub fn id(&self) -> xlib::Window {
        self.id
    }

    pub fn gc(&self) -> xlib::GC {
        self.gc
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Marks the window as an EWMH dock that stays below other windows, and
    /// names it.
    pub fn set_dock_hints(&self, title: &str) -> Result<(), DisplayError> {
        let window_type = self.conn.intern_atom("_NET_WM_WINDOW_TYPE")?;
        let dock = self.conn.intern_atom("_NET_WM_WINDOW_TYPE_DOCK")?;
        self.change_atoms(window_type, &[dock]);

        let pid_atom = self.conn.intern_atom("_NET_WM_PID")?;
        self.change_cardinals(pid_atom, &[c_ulong::from(std::process::id())]);

        // Initial state for the unmapped window; `request_below` repeats it
        // for window managers that only honour client messages.
        let state = self.conn.intern_atom("_NET_WM_STATE")?;
        let below = self.conn.intern_atom("_NET_WM_STATE_BELOW")?;
        self.change_atoms(state, &[below]);

        self.set_title(title)?;
        self.conn.check("set_dock_hints")?;
        trace!("X11: dock hints set on {:#x}", self.id);
        Ok(())
    }

    fn set_title(&self, title: &str) -> Result<(), DisplayError> {
        let c_title = c_string("window title", title)?;
        let net_wm_name = self.conn.intern_atom("_NET_WM_NAME")?;
        let utf8 = self.conn.intern_atom("UTF8_STRING")?;
        unsafe {
            xlib::XStoreName(self.conn.display(), self.id, c_title.as_ptr());
            xlib::XChangeProperty(
                self.conn.display(),
                self.id,
                net_wm_name,
                utf8,
                8,
                xlib::PropModeReplace,
                title.as_ptr() as *const c_uchar,
                title.len() as c_int,
            );
        }
        Ok(())
    }

    /// Asks the window manager to add `_NET_WM_STATE_BELOW`.
    pub fn request_below(&self) -> Result<(), DisplayError> {
        let state = self.conn.intern_atom("_NET_WM_STATE")?;
        let below = self.conn.intern_atom("_NET_WM_STATE_BELOW")?;
        unsafe {
            let mut event: xlib::XClientMessageEvent = mem::zeroed();
            event.type_ = xlib::ClientMessage;
            event.window = self.id;
            event.message_type = state;
            event.format = 32;
            event.data.set_long(0, NET_WM_STATE_ADD);
            event.data.set_long(1, below as c_long);
            event.data.set_long(2, 0);
            event.data.set_long(3, SOURCE_APPLICATION);

            xlib::XSendEvent(
                self.conn.display(),
                self.conn.root(),
                xlib::False,
                xlib::SubstructureRedirectMask | xlib::SubstructureNotifyMask,
                &mut event as *mut _ as *mut xlib::XEvent,
            );
        }
        self.conn.check("XSendEvent(_NET_WM_STATE)")
    }

    pub fn map(&self) -> Result<(), DisplayError> {
        unsafe { xlib::XMapWindow(self.conn.display(), self.id) };
        self.conn.check("XMapWindow")?;
        info!("X11: window {:#x} mapped", self.id);
        Ok(())
    }

    /// Reserves the bar's screen edge through `_NET_WM_STRUT_PARTIAL` and the
    /// older `_NET_WM_STRUT`.
    pub fn set_struts(&self, strut: &Strut) -> Result<(), DisplayError> {
        let partial_atom = self.conn.intern_atom("_NET_WM_STRUT_PARTIAL")?;
        let legacy_atom = self.conn.intern_atom("_NET_WM_STRUT")?;
        let partial = strut.partial().map(c_ulong::from);
        let legacy = strut.legacy().map(c_ulong::from);
        self.change_cardinals(partial_atom, &partial);
        self.change_cardinals(legacy_atom, &legacy);
        self.conn.check("XChangeProperty(_NET_WM_STRUT)")?;
        debug!("X11: struts {:?}", legacy);
        Ok(())
    }

    fn change_atoms(&self, property: xlib::Atom, values: &[xlib::Atom]) {
        self.change_longs(property, xlib::XA_ATOM, values);
    }

    fn change_cardinals(&self, property: xlib::Atom, values: &[c_ulong]) {
        self.change_longs(property, xlib::XA_CARDINAL, values);
    }

    // Format-32 properties travel as C longs on the client side.
    fn change_longs(&self, property: xlib::Atom, kind: xlib::Atom, values: &[c_ulong]) {
        unsafe {
            xlib::XChangeProperty(
                self.conn.display(),
                self.id,
                property,
                kind,
                32,
                xlib::PropModeReplace,
                values.as_ptr() as *const c_uchar,
                values.len() as c_int,
            );
        }
    }
}

impl Drop for DockWindow {
    fn drop(&mut self) {
        info!("X11: destroying window {:#x}", self.id);
        let display = self.conn.display();
        if display.is_null() {
            warn!("X11: display already gone, leaking window {:#x}", self.id);
            return;
        }
        unsafe {
            xlib::XFreeGC(display, self.gc);
            xlib::XDestroyWindow(display, self.id);
            xlib::XFlush(display);
        }
    }
}
