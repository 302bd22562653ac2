// src/display/mod.rs

//! Display service seams.
//!
//! - `OutputTopology`: monitor layout queries used to pick an output
//! - `Presenter`: pushes a finished canvas to the bar window
//! - `EventSource` / `EventLoopWaker`: the blocking event stream and the
//!   cross-thread nudge that unblocks it
//!
//! `x11` implements these against Xlib and RandR; `headless` implements them
//! in memory for tests and for running without a server.

pub mod headless;
pub mod x11;

use std::ffi::CString;
use thiserror::Error;

use crate::canvas::Canvas;

/// Identifier of a physical output in the display topology.
pub type OutputId = u64;
/// Identifier of the CRTC (scan-out engine) driving an output.
pub type CrtcId = u64;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("XInitThreads failed")]
    InitThreads,
    #[error("cannot open X display; check DISPLAY and the X server")]
    OpenDisplay,
    #[error("X server lacks the {0} extension")]
    MissingExtension(&'static str),
    #[error("{call} failed for id {id:#x}")]
    Query { call: &'static str, id: u64 },
    #[error("{call} raised X protocol error {code} (request {request})")]
    Protocol {
        call: &'static str,
        code: u8,
        request: u8,
    },
    #[error("XCreateImage failed for a {width}x{height} frame")]
    CreateImage { width: u32, height: u32 },
    #[error("invalid geometry: {0}")]
    Geometry(String),
    #[error("{what} {value:?} contains a NUL byte")]
    InvalidString { what: &'static str, value: String },
    #[error("display connection closed")]
    Disconnected,
}

/// Converts `value` for an Xlib call that takes a C string.
pub(crate) fn c_string(what: &'static str, value: &str) -> Result<CString, DisplayError> {
    CString::new(value).map_err(|_| DisplayError::InvalidString {
        what,
        value: value.to_string(),
    })
}

/// Static description of an output at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    pub name: String,
    /// Physical height; zero means nothing is plugged in.
    pub height_mm: u32,
    /// CRTC currently driving the output, if any.
    pub crtc: Option<CrtcId>,
}

/// Position and size of a CRTC on the root window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrtcGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Read access to the multi-monitor resource graph.
pub trait OutputTopology {
    /// The user-designated primary output, if any.
    fn primary_output(&self) -> Result<Option<OutputId>, DisplayError>;
    /// Every output, in the order the server reports them.
    fn outputs(&self) -> Result<Vec<OutputId>, DisplayError>;
    fn output_descriptor(&self, output: OutputId) -> Result<OutputDescriptor, DisplayError>;
    fn crtc_geometry(&self, crtc: CrtcId) -> Result<CrtcGeometry, DisplayError>;
}

/// Sink for finished frames.
pub trait Presenter: Send {
    fn present(&mut self, canvas: &Canvas) -> Result<(), DisplayError>;
}

/// Events surfaced by the blocking event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Posted by an `EventLoopWaker` to unblock the dispatch loop.
    Wake,
    /// Part of the window needs repainting.
    Exposed,
    /// Anything the bar does not act on, tagged with the native event type.
    Other(i32),
}

/// Blocking stream of window-system events, consumed on the dispatch thread.
pub trait EventSource: Send {
    /// Blocks until the next event arrives.
    fn next_event(&mut self) -> Result<DisplayEvent, DisplayError>;
}

/// Cross-thread signal that makes a blocked `EventSource::next_event` return.
pub trait EventLoopWaker: Send + Sync {
    fn wake(&self) -> Result<(), DisplayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn nul_in_c_string_is_its_own_error() {
        assert_eq!(c_string("window title", "dockbar").unwrap().as_bytes(), b"dockbar");
        let err = c_string("window title", "dock\0bar").unwrap_err();
        assert!(matches!(
            err,
            DisplayError::InvalidString {
                what: "window title",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "window title \"dock\\0bar\" contains a NUL byte"
        );
    }
}
