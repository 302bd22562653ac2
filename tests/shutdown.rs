// tests/shutdown.rs
//
// End-to-end runs of the supervisor against the headless display driver.

use anyhow::{bail, Result};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use test_log::test;

use dockbar::bar::{prepare, supervise};
use dockbar::canvas::{Canvas, CanvasView};
use dockbar::color::Color;
use dockbar::config::Config;
use dockbar::display::headless::{
    HeadlessEventSource, HeadlessPresenter, HeadlessTopology, HeadlessWaker,
};
use dockbar::display::{DisplayError, DisplayEvent, EventLoopWaker};
use dockbar::drawer::{Drawer, DrawerRegistry, LoadedDrawer, Registration};
use dockbar::render_loop::RenderLoop;
use dockbar::state::State;

const BG: Color = Color::Rgb(0x1d, 0x1f, 0x21);
const INK: Color = Color::Rgb(0xc5, 0xc8, 0xc6);

/// Paints its slice for `frames` ticks, then fails.
struct Expiring {
    frames: u32,
}

impl Drawer for Expiring {
    fn draw(&mut self, view: &mut CanvasView<'_>) -> Result<()> {
        if self.frames == 0 {
            bail!("battery sensor unplugged");
        }
        self.frames -= 1;
        view.fill(INK);
        Ok(())
    }
}

struct Blank;

impl Drawer for Blank {
    fn draw(&mut self, _view: &mut CanvasView<'_>) -> Result<()> {
        Ok(())
    }
}

/// Waker whose target has gone away.
struct Unreachable;

impl EventLoopWaker for Unreachable {
    fn wake(&self) -> Result<(), DisplayError> {
        Err(DisplayError::Disconnected)
    }
}

fn expiring(_state: &State) -> Result<Box<dyn Drawer>> {
    Ok(Box::new(Expiring { frames: 3 }))
}

fn blank(_state: &State) -> Result<Box<dyn Drawer>> {
    Ok(Box::new(Blank))
}

#[test]
fn drawer_failure_reaches_supervisor_after_event_thread_stops() {
    let mut registry = DrawerRegistry::new();
    registry
        .register(
            "zz-expiring",
            Registration {
                enabled_by_default: true,
                constructor: expiring,
            },
        )
        .unwrap();
    registry
        .register(
            "aa-blank",
            Registration {
                enabled_by_default: true,
                constructor: blank,
            },
        )
        .unwrap();

    let topology = HeadlessTopology::new(1280, 1024, 270);
    let prepared = prepare(Config::default(), &topology, &registry).unwrap();
    let names: Vec<&str> = prepared.drawers.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["aa-blank", "zz-expiring"]);

    let presenter = HeadlessPresenter::new();
    let frames = presenter.frames();
    let (events, feed) = HeadlessEventSource::channel();
    let waker = HeadlessWaker::new(feed.clone());
    let wakes = waker.wake_count();

    // Unrelated traffic the dispatch loop must not stop on.
    feed.send(DisplayEvent::Exposed).unwrap();
    feed.send(DisplayEvent::Other(22)).unwrap();

    let render_loop = RenderLoop::new(
        Canvas::new(u32::from(prepared.output.width_px), prepared.height_px as u32),
        prepared.drawers,
        presenter,
        BG,
        Duration::from_millis(2),
    );
    let err = supervise(render_loop, events, Arc::new(waker)).unwrap_err();

    let chain = format!("{:#}", err);
    assert!(chain.contains("zz-expiring"), "{}", chain);
    assert!(chain.contains("battery sensor unplugged"), "{}", chain);
    assert_eq!(wakes.load(Ordering::SeqCst), 1);

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 3, "the failing tick is never presented");
    let last = &frames[2];
    // 1280 / 2 = 640: the right half belongs to the expiring drawer.
    assert_eq!(last.pixel(0, 0), Some(BG.to_pixel()));
    assert_eq!(last.pixel(640, 0), Some(INK.to_pixel()));
}

#[test]
fn cooperative_stop_returns_ok() {
    let presenter = HeadlessPresenter::new();
    let frames = presenter.frames();
    let (events, feed) = HeadlessEventSource::channel();
    let waker = HeadlessWaker::new(feed);

    let render_loop = RenderLoop::new(
        Canvas::new(60, 6),
        vec![LoadedDrawer::new("blank", Box::new(Blank))],
        presenter,
        BG,
        Duration::from_millis(2),
    );
    let stop = render_loop.stop_handle();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        stop.request_stop();
    });

    supervise(render_loop, events, Arc::new(waker)).unwrap();
    stopper.join().unwrap();
    assert!(!frames.lock().unwrap().is_empty());
}

#[test]
fn presentation_failure_is_reported() {
    let (events, feed) = HeadlessEventSource::channel();
    let render_loop = RenderLoop::new(
        Canvas::new(30, 3),
        vec![LoadedDrawer::new("blank", Box::new(Blank))],
        HeadlessPresenter::failing_after(1),
        BG,
        Duration::from_millis(1),
    );
    let err = supervise(render_loop, events, Arc::new(HeadlessWaker::new(feed))).unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("Presenting frame 2"), "{}", chain);
    assert!(chain.contains("XPutImage"), "{}", chain);
}

#[test]
fn failed_wake_still_returns_the_drawer_error() {
    // The feed stays open, so the event thread blocks until it is dropped.
    let (events, feed) = HeadlessEventSource::channel();
    let render_loop = RenderLoop::new(
        Canvas::new(20, 2),
        vec![LoadedDrawer::new(
            "zz-expiring",
            Box::new(Expiring { frames: 0 }),
        )],
        HeadlessPresenter::new(),
        BG,
        Duration::from_millis(1),
    );

    let err = supervise(render_loop, events, Arc::new(Unreachable)).unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("wake failed"), "{}", chain);
    assert!(chain.contains("display connection closed"), "{}", chain);
    assert!(chain.contains("zz-expiring"), "{}", chain);
    assert!(chain.contains("battery sensor unplugged"), "{}", chain);

    // Lets the detached event thread exit.
    drop(feed);
}
