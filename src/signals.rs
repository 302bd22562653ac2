// src/signals.rs

//! SIGINT/SIGTERM turn into a cooperative stop of the render loop.
//!
//! The handler only flips an atomic flag; a small watcher thread polls it and
//! calls `StopHandle::request_stop`.

use log::{debug, info};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::render_loop::StopHandle;

static STOP_SIGNALLED: AtomicBool = AtomicBool::new(false);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

extern "C" fn on_stop_signal(_signal: libc::c_int) {
    STOP_SIGNALLED.store(true, Ordering::SeqCst);
}

/// Installs the handler for SIGINT and SIGTERM.
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_stop_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic.
        unsafe { signal::sigaction(sig, &action) }?;
        debug!("Signals: handler installed for {:?}", sig);
    }
    Ok(())
}

/// Spawns the `signals` thread. It exits once a signal has been forwarded or
/// `stop` has been requested by someone else.
pub fn watch(stop: StopHandle) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || loop {
            if STOP_SIGNALLED.load(Ordering::SeqCst) {
                info!("Signals: termination requested, stopping the bar");
                stop.request_stop();
                return;
            }
            if stop.is_stop_requested() {
                return;
            }
            thread::sleep(POLL_INTERVAL);
        })
}
