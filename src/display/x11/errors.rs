// src/display/x11/errors.rs

//! Xlib error trap.
//!
//! Xlib's default handler exits the process on any protocol error. The
//! handler installed here records the most recent error instead, and
//! `Connection::check` turns it into a `DisplayError` after an `XSync`.

use log::warn;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Once;

use libc::c_int;
use x11::xlib;

// Packed as 0x01_RR_CC (marker, request code, error code); zero when empty.
static LAST_ERROR: AtomicU32 = AtomicU32::new(0);
static INSTALL: Once = Once::new();

const PRESENT: u32 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrappedError {
    pub code: u8,
    pub request: u8,
}

fn pack(error: TrappedError) -> u32 {
    PRESENT | (u32::from(error.request) << 8) | u32::from(error.code)
}

fn unpack(raw: u32) -> Option<TrappedError> {
    (raw & PRESENT != 0).then(|| TrappedError {
        code: (raw & 0xff) as u8,
        request: ((raw >> 8) & 0xff) as u8,
    })
}

unsafe extern "C" fn trap(_display: *mut xlib::Display, event: *mut xlib::XErrorEvent) -> c_int {
    if event.is_null() {
        return 0;
    }
    let (code, request, resource) = unsafe {
        (
            (*event).error_code,
            (*event).request_code,
            (*event).resourceid,
        )
    };
    warn!(
        "X11: protocol error {} on request {} (resource {:#x})",
        code, request, resource
    );
    LAST_ERROR.store(pack(TrappedError { code, request }), Ordering::SeqCst);
    0
}

/// Installs the trap once per process.
pub fn install() {
    INSTALL.call_once(|| unsafe {
        xlib::XSetErrorHandler(Some(trap));
    });
}

/// Returns and clears the last trapped error.
pub fn take() -> Option<TrappedError> {
    unpack(LAST_ERROR.swap(0, Ordering::SeqCst))
}
