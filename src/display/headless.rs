// src/display/headless.rs

//! In-memory display driver.
//!
//! Presented frames are copied into a shared list, events come from an
//! in-process channel, and waking posts `DisplayEvent::Wake` onto that same
//! channel. Used by the test suites and anywhere a real server is not
//! available.

use log::{info, trace};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use super::{
    CrtcGeometry, CrtcId, DisplayError, DisplayEvent, EventLoopWaker, EventSource,
    OutputDescriptor, OutputId, OutputTopology, Presenter,
};
use crate::canvas::Canvas;

/// Frames recorded by a `HeadlessPresenter`, oldest first.
pub type FrameLog = Arc<Mutex<Vec<Canvas>>>;

#[derive(Default)]
pub struct HeadlessPresenter {
    frames: FrameLog,
    fail_after: Option<usize>,
}

impl HeadlessPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presenter that records `frames` frames and then fails every call.
    pub fn failing_after(frames: usize) -> Self {
        HeadlessPresenter {
            frames: FrameLog::default(),
            fail_after: Some(frames),
        }
    }

    /// Shared handle to the recorded frames.
    pub fn frames(&self) -> FrameLog {
        Arc::clone(&self.frames)
    }
}

impl Presenter for HeadlessPresenter {
    fn present(&mut self, canvas: &Canvas) -> Result<(), DisplayError> {
        let mut frames = self.frames.lock().map_err(|_| DisplayError::Disconnected)?;
        if self.fail_after.is_some_and(|limit| frames.len() >= limit) {
            return Err(DisplayError::Protocol {
                call: "XPutImage",
                code: 3,
                request: 72,
            });
        }
        trace!("Headless: frame {} ({:?})", frames.len() + 1, canvas);
        frames.push(canvas.clone());
        Ok(())
    }
}

/// Event source fed through an in-process channel.
pub struct HeadlessEventSource {
    rx: Receiver<DisplayEvent>,
}

impl HeadlessEventSource {
    /// Returns the source and the sender that feeds it.
    pub fn channel() -> (Self, Sender<DisplayEvent>) {
        let (tx, rx) = channel();
        (HeadlessEventSource { rx }, tx)
    }
}

impl EventSource for HeadlessEventSource {
    fn next_event(&mut self) -> Result<DisplayEvent, DisplayError> {
        self.rx.recv().map_err(|_| DisplayError::Disconnected)
    }
}

/// Waker that posts `DisplayEvent::Wake` and counts how often it fired.
pub struct HeadlessWaker {
    target: Option<Sender<DisplayEvent>>,
    wakes: Arc<AtomicUsize>,
}

impl HeadlessWaker {
    pub fn new(target: Sender<DisplayEvent>) -> Self {
        HeadlessWaker {
            target: Some(target),
            wakes: Arc::default(),
        }
    }

    /// Waker with no event source, plus its wake counter.
    pub fn counting() -> (Self, Arc<AtomicUsize>) {
        let wakes = Arc::new(AtomicUsize::new(0));
        (
            HeadlessWaker {
                target: None,
                wakes: Arc::clone(&wakes),
            },
            wakes,
        )
    }

    pub fn wake_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.wakes)
    }
}

impl EventLoopWaker for HeadlessWaker {
    fn wake(&self) -> Result<(), DisplayError> {
        self.wakes.fetch_add(1, Ordering::SeqCst);
        if let Some(target) = &self.target {
            target
                .send(DisplayEvent::Wake)
                .map_err(|_| DisplayError::Disconnected)?;
        }
        Ok(())
    }
}

/// Fixed single-output topology.
#[derive(Debug, Clone)]
pub struct HeadlessTopology {
    pub output: OutputDescriptor,
    pub geometry: CrtcGeometry,
}

const HEADLESS_OUTPUT: OutputId = 1;
const HEADLESS_CRTC: CrtcId = 2;

impl HeadlessTopology {
    pub fn new(width: u32, height: u32, height_mm: u32) -> Self {
        info!("Headless: {}x{} output, {}mm tall", width, height, height_mm);
        HeadlessTopology {
            output: OutputDescriptor {
                name: "HEADLESS-1".to_string(),
                height_mm,
                crtc: Some(HEADLESS_CRTC),
            },
            geometry: CrtcGeometry {
                x: 0,
                y: 0,
                width,
                height,
            },
        }
    }
}

impl OutputTopology for HeadlessTopology {
    fn primary_output(&self) -> Result<Option<OutputId>, DisplayError> {
        Ok(Some(HEADLESS_OUTPUT))
    }

    fn outputs(&self) -> Result<Vec<OutputId>, DisplayError> {
        Ok(vec![HEADLESS_OUTPUT])
    }

    fn output_descriptor(&self, output: OutputId) -> Result<OutputDescriptor, DisplayError> {
        if output != HEADLESS_OUTPUT {
            return Err(DisplayError::Query {
                call: "output_descriptor",
                id: output,
            });
        }
        Ok(self.output.clone())
    }

    fn crtc_geometry(&self, crtc: CrtcId) -> Result<CrtcGeometry, DisplayError> {
        if crtc != HEADLESS_CRTC {
            return Err(DisplayError::Query {
                call: "crtc_geometry",
                id: crtc,
            });
        }
        Ok(self.geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn waker_unblocks_the_event_source() {
        let (mut source, tx) = HeadlessEventSource::channel();
        let waker = HeadlessWaker::new(tx);
        let count = waker.wake_count();
        std::thread::spawn(move || waker.wake().unwrap());
        assert_eq!(source.next_event().unwrap(), DisplayEvent::Wake);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closed_source_reports_disconnect() {
        let (mut source, tx) = HeadlessEventSource::channel();
        drop(tx);
        assert!(matches!(
            source.next_event(),
            Err(DisplayError::Disconnected)
        ));
    }

    #[test]
    fn failing_presenter_stops_recording() {
        let mut presenter = HeadlessPresenter::failing_after(1);
        let canvas = Canvas::new(2, 2);
        presenter.present(&canvas).unwrap();
        assert!(presenter.present(&canvas).is_err());
        assert_eq!(presenter.frames().lock().unwrap().len(), 1);
    }
}
