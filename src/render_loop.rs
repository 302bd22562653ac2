// src/render_loop.rs

//! Timer-driven repaint loop and its shutdown handoff.
//!
//! The loop runs on its own thread. Each tick clears the canvas, composes all
//! drawers and presents the frame. When the loop ends (first error or a
//! cooperative stop) the outcome goes to the supervisor over a single-slot
//! channel, then the event thread is told to stop and woken so it can act on
//! that message itself.

use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::display::{DisplayError, EventLoopWaker, Presenter};
use crate::drawer::LoadedDrawer;
use crate::events::Control;
use crate::layout;

/// Name of the thread running the render loop.
pub const THREAD_NAME: &str = "render";

/// Shared flag asking the render loop to finish after its current tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of a `RenderLoop`: `Running` until `finish` starts draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Draining,
    Stopped,
}

pub struct RenderLoop<P> {
    canvas: Canvas,
    drawers: Vec<LoadedDrawer>,
    presenter: P,
    background: Color,
    interval: Duration,
    stop: StopHandle,
    frames: u64,
    phase: Phase,
}

impl<P: Presenter> RenderLoop<P> {
    pub fn new(
        canvas: Canvas,
        drawers: Vec<LoadedDrawer>,
        presenter: P,
        background: Color,
        interval: Duration,
    ) -> Self {
        RenderLoop {
            canvas,
            drawers,
            presenter,
            background,
            interval,
            stop: StopHandle::default(),
            frames: 0,
            phase: Phase::Running,
        }
    }

    /// Replaces the loop's stop flag with one shared with another party.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// One tick: clear, compose, present. A compose failure skips
    /// presentation so a half-painted frame never reaches the screen.
    pub fn render_frame(&mut self) -> Result<()> {
        let frame = self.frames + 1;
        self.canvas.clear(self.background);
        layout::compose(&mut self.canvas, &mut self.drawers)
            .with_context(|| format!("Drawing frame {}", frame))?;
        self.presenter
            .present(&self.canvas)
            .with_context(|| format!("Presenting frame {}", frame))?;
        self.frames = frame;
        trace!("Render: presented frame {}", frame);
        Ok(())
    }

    /// Ticks until a frame fails or a stop is requested.
    ///
    /// Plain sleep between ticks: no drift correction and no catch-up.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "Render: loop started with {} drawers every {:?}",
            self.drawers.len(),
            self.interval
        );
        self.phase = Phase::Running;
        loop {
            if self.stop.is_stop_requested() {
                info!("Render: stop requested after {} frames", self.frames);
                return Ok(());
            }
            self.render_frame()?;
            thread::sleep(self.interval);
        }
    }

    /// Drains `outcome` and moves the loop to `Stopped`.
    pub fn finish(
        &mut self,
        outcome: Result<()>,
        outcome_tx: &SyncSender<Result<()>>,
        control_tx: &Sender<Control>,
        waker: &dyn EventLoopWaker,
    ) -> Result<(), DisplayError> {
        self.phase = Phase::Draining;
        match &outcome {
            Ok(()) => info!("Render: draining after clean stop"),
            Err(e) => info!("Render: draining after error: {:#}", e),
        }
        let woken = drain(outcome, outcome_tx, control_tx, waker);
        self.phase = Phase::Stopped;
        debug!("Render: stopped after {} frames", self.frames);
        woken
    }
}

/// Hands the loop's outcome to the supervisor and tells the event thread to
/// stop.
///
/// The outcome slot holds a single value; a second outcome is dropped with a
/// warning rather than blocking the render thread. A failed wake is returned:
/// the event thread may then stay blocked and must not be joined.
pub fn drain(
    outcome: Result<()>,
    outcome_tx: &SyncSender<Result<()>>,
    control_tx: &Sender<Control>,
    waker: &dyn EventLoopWaker,
) -> Result<(), DisplayError> {
    match outcome_tx.try_send(outcome) {
        Ok(()) => debug!("Render: outcome delivered"),
        Err(TrySendError::Full(dropped)) => {
            warn!("Render: outcome slot already full, dropping {:?}", dropped)
        }
        Err(TrySendError::Disconnected(dropped)) => {
            warn!("Render: supervisor gone, dropping {:?}", dropped)
        }
    }
    if control_tx.send(Control::Stop).is_err() {
        debug!("Render: event thread already left its loop");
        return Ok(());
    }
    waker.wake().inspect_err(|e| {
        warn!("Render: failed to wake event thread: {}", e);
    })
}

/// Starts `render_loop` on the `render` thread.
///
/// The thread's result says whether the event thread was woken. The loop,
/// its canvas and its presenter are dropped on that thread once the outcome
/// has been handed off.
pub fn spawn<P>(
    mut render_loop: RenderLoop<P>,
    outcome_tx: SyncSender<Result<()>>,
    control_tx: Sender<Control>,
    waker: Arc<dyn EventLoopWaker>,
) -> std::io::Result<JoinHandle<Result<(), DisplayError>>>
where
    P: Presenter + 'static,
{
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || {
            let outcome = render_loop.run();
            render_loop.finish(outcome, &outcome_tx, &control_tx, waker.as_ref())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasView;
    use crate::display::headless::{HeadlessPresenter, HeadlessWaker};
    use crate::drawer::Drawer;
    use anyhow::bail;
    use std::sync::mpsc::{channel, sync_channel};
    use test_log::test;

    struct Solid(Color);

    impl Drawer for Solid {
        fn draw(&mut self, view: &mut CanvasView<'_>) -> Result<()> {
            view.fill(self.0);
            Ok(())
        }
    }

    /// Succeeds `remaining` times, then fails.
    struct Countdown {
        remaining: u32,
    }

    impl Drawer for Countdown {
        fn draw(&mut self, _view: &mut CanvasView<'_>) -> Result<()> {
            if self.remaining == 0 {
                bail!("sensor vanished");
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    const BG: Color = Color::Rgb(9, 9, 9);
    const INK: Color = Color::Rgb(200, 100, 50);

    #[test]
    fn frame_clears_composes_and_presents() {
        let presenter = HeadlessPresenter::new();
        let frames = presenter.frames();
        let mut render_loop = RenderLoop::new(
            Canvas::new(11, 3),
            vec![
                LoadedDrawer::new("a", Box::new(Solid(INK))),
                LoadedDrawer::new("b", Box::new(Solid(INK))),
            ],
            presenter,
            BG,
            Duration::from_millis(1),
        );
        render_loop.render_frame().unwrap();

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!((frame.width(), frame.height()), (11, 3));
        assert_eq!(frame.pixel(0, 0), Some(INK.to_pixel()));
        assert_eq!(frame.pixel(9, 2), Some(INK.to_pixel()));
        // 11 / 2 = 5 columns each, the last column is remainder.
        assert_eq!(frame.pixel(10, 1), Some(BG.to_pixel()));
        assert_eq!(render_loop.frames(), 1);
    }

    #[test]
    fn failed_compose_is_not_presented() {
        let presenter = HeadlessPresenter::new();
        let frames = presenter.frames();
        let mut render_loop = RenderLoop::new(
            Canvas::new(10, 2),
            vec![LoadedDrawer::new("gauge", Box::new(Countdown { remaining: 2 }))],
            presenter,
            BG,
            Duration::from_millis(1),
        );
        let err = render_loop.run().unwrap_err();

        assert_eq!(frames.lock().unwrap().len(), 2);
        assert_eq!(render_loop.frames(), 2);
        let chain = format!("{:#}", err);
        assert!(chain.contains("Drawing frame 3"), "{}", chain);
        assert!(chain.contains("gauge"), "{}", chain);
        assert!(chain.contains("sensor vanished"), "{}", chain);
    }

    #[test]
    fn stop_request_is_seen_before_the_next_tick() {
        let presenter = HeadlessPresenter::new();
        let frames = presenter.frames();
        let mut render_loop = RenderLoop::new(
            Canvas::new(4, 1),
            Vec::new(),
            presenter,
            BG,
            Duration::from_millis(1),
        );
        render_loop.stop_handle().request_stop();
        render_loop.run().unwrap();
        assert!(frames.lock().unwrap().is_empty());
    }

    #[test]
    fn drain_delivers_outcome_then_stops_and_wakes() {
        let (outcome_tx, outcome_rx) = sync_channel(1);
        let (control_tx, control_rx) = channel();
        let (waker, wakes) = HeadlessWaker::counting();

        drain(Ok(()), &outcome_tx, &control_tx, &waker).unwrap();
        // The slot is full now; a second outcome must not block.
        drain(Err(anyhow::anyhow!("late")), &outcome_tx, &control_tx, &waker).unwrap();

        assert!(outcome_rx.try_recv().unwrap().is_ok());
        assert!(outcome_rx.try_recv().is_err());
        assert_eq!(control_rx.try_recv().unwrap(), Control::Stop);
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn spawned_loop_reports_through_the_channel() {
        let (outcome_tx, outcome_rx) = sync_channel(1);
        let (control_tx, control_rx) = channel();
        let (waker, wakes) = HeadlessWaker::counting();
        let render_loop = RenderLoop::new(
            Canvas::new(8, 2),
            vec![LoadedDrawer::new("flaky", Box::new(Countdown { remaining: 0 }))],
            HeadlessPresenter::new(),
            BG,
            Duration::from_millis(1),
        );

        let handle = spawn(render_loop, outcome_tx, control_tx, Arc::new(waker)).unwrap();
        let outcome = outcome_rx.recv().unwrap();
        handle.join().unwrap().unwrap();

        assert!(format!("{:#}", outcome.unwrap_err()).contains("flaky"));
        assert_eq!(control_rx.recv().unwrap(), Control::Stop);
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    struct Unreachable;

    impl EventLoopWaker for Unreachable {
        fn wake(&self) -> Result<(), DisplayError> {
            Err(DisplayError::Disconnected)
        }
    }

    #[test]
    fn failed_wake_is_returned_after_the_outcome_is_delivered() {
        let (outcome_tx, outcome_rx) = sync_channel(1);
        let (control_tx, control_rx) = channel();

        let woken = drain(Err(anyhow::anyhow!("boom")), &outcome_tx, &control_tx, &Unreachable);

        assert!(matches!(woken, Err(DisplayError::Disconnected)));
        assert!(outcome_rx.try_recv().unwrap().is_err());
        assert_eq!(control_rx.try_recv().unwrap(), Control::Stop);
    }

    #[test]
    fn wake_is_skipped_once_the_event_thread_is_gone() {
        let (outcome_tx, _outcome_rx) = sync_channel(1);
        let (control_tx, control_rx) = channel();
        drop(control_rx);

        assert!(drain(Ok(()), &outcome_tx, &control_tx, &Unreachable).is_ok());
    }

    #[test]
    fn finish_moves_the_loop_to_stopped() {
        let (outcome_tx, outcome_rx) = sync_channel(1);
        let (control_tx, _control_rx) = channel();
        let (waker, wakes) = HeadlessWaker::counting();
        let mut render_loop = RenderLoop::new(
            Canvas::new(4, 1),
            vec![LoadedDrawer::new("flaky", Box::new(Countdown { remaining: 1 }))],
            HeadlessPresenter::new(),
            BG,
            Duration::from_millis(1),
        );
        assert_eq!(render_loop.phase(), Phase::Running);

        let outcome = render_loop.run();
        assert_eq!(render_loop.phase(), Phase::Running);
        render_loop
            .finish(outcome, &outcome_tx, &control_tx, &waker)
            .unwrap();

        assert_eq!(render_loop.phase(), Phase::Stopped);
        assert_eq!(render_loop.frames(), 1);
        assert!(outcome_rx.try_recv().unwrap().is_err());
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }
}
