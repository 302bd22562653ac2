// src/events.rs

//! The event-delivery thread's loop.
//!
//! Only this thread decides when it stops: after every event it drains its
//! control channel and leaves once a `Control::Stop` has arrived. Other
//! threads ask for that by sending the message and then waking the blocked
//! event source.

use log::{debug, info, trace, warn};
use std::sync::mpsc::{Receiver, TryRecvError};

use crate::display::{DisplayError, DisplayEvent, EventSource};

/// Name of the thread running the dispatch loop.
pub const EVENT_THREAD_NAME: &str = "x11-events";

/// Messages for the event-delivery thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Leave the dispatch loop after the current event.
    Stop,
}

/// Blocks on `source` until a `Stop` is received on `control` or the control
/// channel is disconnected. Returns the number of events handled.
pub fn run_dispatch<S>(source: &mut S, control: &Receiver<Control>) -> Result<u64, DisplayError>
where
    S: EventSource + ?Sized,
{
    info!("Events: dispatch loop started");
    let mut handled = 0u64;
    loop {
        let event = source.next_event()?;
        handled += 1;
        match event {
            DisplayEvent::Wake => trace!("Events: woken"),
            DisplayEvent::Exposed => {
                // The render loop repaints on its own cadence.
                trace!("Events: expose ignored until next tick");
            }
            DisplayEvent::Other(kind) => trace!("Events: ignoring event type {}", kind),
        }

        loop {
            match control.try_recv() {
                Ok(Control::Stop) => {
                    info!("Events: stop received after {} events", handled);
                    return Ok(handled);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Events: control channel closed; leaving dispatch loop");
                    return Ok(handled);
                }
            }
        }
        debug!("Events: no stop pending, blocking again");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::mpsc::channel;
    use test_log::test;

    struct Scripted {
        events: VecDeque<DisplayEvent>,
        // Sent right before the matching event is returned.
        stop_before: Option<usize>,
        stop_tx: Option<std::sync::mpsc::Sender<Control>>,
        served: usize,
    }

    impl EventSource for Scripted {
        fn next_event(&mut self) -> Result<DisplayEvent, DisplayError> {
            if Some(self.served) == self.stop_before {
                if let Some(tx) = &self.stop_tx {
                    tx.send(Control::Stop).unwrap();
                }
            }
            self.served += 1;
            self.events.pop_front().ok_or(DisplayError::Disconnected)
        }
    }

    #[test]
    fn keeps_dispatching_until_stop_arrives() {
        let (tx, rx) = channel();
        let mut source = Scripted {
            events: [
                DisplayEvent::Exposed,
                DisplayEvent::Other(22),
                DisplayEvent::Wake,
                DisplayEvent::Other(22),
            ]
            .into_iter()
            .collect(),
            stop_before: Some(2),
            stop_tx: Some(tx),
            served: 0,
        };
        let handled = run_dispatch(&mut source, &rx).unwrap();
        assert_eq!(handled, 3);
        assert_eq!(source.events.len(), 1, "the last event stays queued");
    }

    #[test]
    fn disconnected_control_channel_ends_the_loop() {
        let (tx, rx) = channel::<Control>();
        drop(tx);
        let mut source = Scripted {
            events: [DisplayEvent::Other(12)].into_iter().collect(),
            stop_before: None,
            stop_tx: None,
            served: 0,
        };
        assert_eq!(run_dispatch(&mut source, &rx).unwrap(), 1);
    }

    #[test]
    fn source_errors_propagate() {
        let (_tx, rx) = channel::<Control>();
        let mut source = Scripted {
            events: VecDeque::new(),
            stop_before: None,
            stop_tx: None,
            served: 0,
        };
        assert!(matches!(
            run_dispatch(&mut source, &rx),
            Err(DisplayError::Disconnected)
        ));
    }
}
