// src/display/x11/events.rs

use log::trace;
use std::mem;
use std::sync::Arc;

use x11::xlib;

use super::DockWindow;
use crate::display::{DisplayError, DisplayEvent, EventLoopWaker, EventSource};

/// Private atom tagging wake-up client messages.
const WAKE_ATOM_NAME: &str = "DOCKBAR_WAKE";

/// Wakes a thread blocked in `XNextEvent` by sending a `ClientMessage` to
/// the bar window.
pub struct X11Waker {
    window: Arc<DockWindow>,
    wake_atom: xlib::Atom,
}

impl X11Waker {
    pub fn new(window: Arc<DockWindow>) -> Result<Self, DisplayError> {
        let wake_atom = window.connection().intern_atom(WAKE_ATOM_NAME)?;
        Ok(X11Waker { window, wake_atom })
    }

    /// Atom an `X11EventSource` must recognise as a wake-up.
    pub fn wake_atom(&self) -> xlib::Atom {
        self.wake_atom
    }
}

impl EventLoopWaker for X11Waker {
    fn wake(&self) -> Result<(), DisplayError> {
        let conn = self.window.connection();
        let status = unsafe {
            let mut event: xlib::XClientMessageEvent = mem::zeroed();
            event.type_ = xlib::ClientMessage;
            event.window = self.window.id();
            event.message_type = self.wake_atom;
            event.format = 32;
            event.data.set_long(0, 0);

            let status = xlib::XSendEvent(
                conn.display(),
                self.window.id(),
                xlib::False,
                xlib::NoEventMask,
                &mut event as *mut _ as *mut xlib::XEvent,
            );
            xlib::XFlush(conn.display());
            status
        };
        if status == 0 {
            return Err(DisplayError::Query {
                call: "XSendEvent",
                id: self.window.id(),
            });
        }
        trace!("X11: wake sent to {:#x}", self.window.id());
        Ok(())
    }
}

/// Blocking `XNextEvent` reader for the bar window.
pub struct X11EventSource {
    window: Arc<DockWindow>,
    wake_atom: xlib::Atom,
}

impl X11EventSource {
    pub fn new(window: Arc<DockWindow>, wake_atom: xlib::Atom) -> Self {
        X11EventSource { window, wake_atom }
    }
}

impl EventSource for X11EventSource {
    fn next_event(&mut self) -> Result<DisplayEvent, DisplayError> {
        let display = self.window.connection().display();
        unsafe {
            let mut event: xlib::XEvent = mem::zeroed();
            xlib::XNextEvent(display, &mut event);

            Ok(match event.get_type() {
                xlib::ClientMessage if event.client_message.message_type == self.wake_atom => {
                    DisplayEvent::Wake
                }
                xlib::Expose => DisplayEvent::Exposed,
                other => DisplayEvent::Other(other),
            })
        }
    }
}
