// src/display/x11/mod.rs
//! X11 display service: Xlib connection, RandR topology, the dock window,
//! image presentation and the blocking event reader.

mod connection;
mod errors;
mod events;
mod present;
mod randr;
mod window;

pub use connection::Connection;
pub use events::{X11EventSource, X11Waker};
pub use present::X11Presenter;
pub use randr::RandrTopology;
pub use window::DockWindow;
