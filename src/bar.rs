// src/bar.rs

//! Startup and supervision.
//!
//! `run` wires the X11 display service to the render loop; `supervise` owns
//! the two worker threads for any display implementation and waits for the
//! render loop's outcome.

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::canvas::Canvas;
use crate::config::Config;
use crate::display::x11::{
    Connection, DockWindow, RandrTopology, X11EventSource, X11Presenter, X11Waker,
};
use crate::display::{EventLoopWaker, EventSource, OutputTopology, Presenter};
use crate::drawer::{DrawerRegistry, LoadedDrawer};
use crate::events::{self, EVENT_THREAD_NAME};
use crate::geometry::BarGeometry;
use crate::output::{select_output, OutputInfo};
use crate::render_loop::{self, RenderLoop, StopHandle};
use crate::resolution::Resolution;
use crate::state::State;

/// Everything derived from the chosen output before any window exists.
pub struct Prepared {
    pub output: OutputInfo,
    pub state: State,
    pub drawers: Vec<LoadedDrawer>,
    /// Bar height in pixels on the chosen output.
    pub height_px: i32,
}

/// Picks the output, derives the resolution and instantiates the drawers.
pub fn prepare(
    config: Config,
    topology: &dyn OutputTopology,
    registry: &DrawerRegistry,
) -> Result<Prepared> {
    let output = select_output(topology).context("Choosing the monitor to display on")?;
    let resolution = Resolution::new(output.height_px, output.height_mm);
    let state = State::new(resolution, config);
    let height_px = state.resolution.pixels(state.config.bar.height_mm);
    debug!(
        "Bar: {}mm is {}px at {:.2}px/mm",
        state.config.bar.height_mm,
        height_px,
        resolution.pixels_per_millimeter()
    );
    let drawers = registry
        .instantiate(&state)
        .context("Instantiating drawers")?;
    Ok(Prepared {
        output,
        state,
        drawers,
        height_px,
    })
}

/// Runs the bar on the X server named by `DISPLAY` until a drawer or the
/// display fails.
pub fn run(config: Config) -> Result<()> {
    run_until(config, StopHandle::default())
}

/// Like `run`, but also returns `Ok(())` once `stop` is requested.
pub fn run_until(config: Config, stop: StopHandle) -> Result<()> {
    let conn = Arc::new(Connection::open().context("Connecting to the X server")?);
    let prepared = {
        let topology = RandrTopology::new(&conn).context("Reading the RandR topology")?;
        prepare(config, &topology, &DrawerRegistry::builtin())?
    };
    let Prepared {
        output,
        state,
        drawers,
        height_px,
    } = prepared;
    let bar = &state.config.bar;
    let background = state.config.appearance.background;

    let (_, root_height) = conn.root_size();
    let geometry = BarGeometry::new(&output, root_height, height_px, bar.edge)
        .context("Sizing the bar window")?;

    let window = Arc::new(
        DockWindow::create(Arc::clone(&conn), &geometry, background)
            .context("Creating the bar window")?,
    );
    window
        .set_dock_hints(&bar.title)
        .context("Setting window manager hints")?;
    window.map().context("Mapping the bar window")?;
    window
        .request_below()
        .context("Requesting below stacking")?;
    window
        .set_struts(&geometry.strut)
        .context("Reserving the screen edge")?;

    let waker = X11Waker::new(Arc::clone(&window)).context("Creating the event waker")?;
    let events = X11EventSource::new(Arc::clone(&window), waker.wake_atom());
    let presenter = X11Presenter::new(Arc::clone(&window));

    let render_loop = RenderLoop::new(
        Canvas::new(geometry.width, geometry.height),
        drawers,
        presenter,
        background,
        state.config.render.interval(),
    )
    .with_stop_handle(stop);

    let outcome = supervise(render_loop, events, Arc::new(waker));
    info!("Bar: shutting down the X11 session");
    outcome
}

/// Starts the render and event threads, waits for the render outcome and
/// joins both threads before returning it.
///
/// If the event thread fails on its own, the render loop is asked to stop and
/// the event error is returned instead of the render loop's clean exit. If
/// the event thread cannot be woken it is left detached, and the wake error
/// is returned alongside the render outcome.
pub fn supervise<P, S>(
    render_loop: RenderLoop<P>,
    events: S,
    waker: Arc<dyn EventLoopWaker>,
) -> Result<()>
where
    P: Presenter + 'static,
    S: EventSource + 'static,
{
    let (outcome_tx, outcome_rx) = mpsc::sync_channel(1);
    let (control_tx, control_rx) = mpsc::channel();

    let stop = render_loop.stop_handle();
    let dispatcher = thread::Builder::new()
        .name(EVENT_THREAD_NAME.to_string())
        .spawn(move || {
            let mut events = events;
            let result = events::run_dispatch(&mut events, &control_rx);
            if let Err(e) = &result {
                error!("Events: dispatch failed: {}", e);
                stop.request_stop();
            }
            result
        })
        .context("Spawning the event thread")?;

    let renderer = match render_loop::spawn(
        render_loop,
        outcome_tx,
        control_tx,
        Arc::clone(&waker),
    ) {
        Ok(handle) => handle,
        Err(e) => {
            // The control sender went down with the closure; a wake lets the
            // event thread notice the disconnect.
            if waker.wake().is_ok() {
                let _ = dispatcher.join();
            }
            return Err(e).context("Spawning the render thread");
        }
    };
    info!("Bar: running");

    // Only a panic drops the sender without an outcome; the panic also drops
    // the control sender, so a wake is enough for the event thread to leave.
    let outcome = outcome_rx
        .recv()
        .unwrap_or_else(|_| Err(anyhow!("render thread exited without reporting an outcome")));
    let woken = match renderer.join() {
        Ok(woken) => woken,
        Err(_) => {
            error!("Bar: render thread panicked");
            waker.wake()
        }
    };

    if let Err(wake_error) = woken {
        // The event thread may stay blocked forever; leave it detached.
        warn!("Bar: event thread could not be woken, not joining it");
        drop(dispatcher);
        return match outcome {
            Err(e) => Err(e.context(format!(
                "Event thread left running: wake failed: {}",
                wake_error
            ))),
            Ok(()) => Err(wake_error).context("Waking the event thread for shutdown"),
        };
    }

    let dispatch = match dispatcher.join() {
        Ok(result) => result,
        Err(_) => {
            error!("Bar: event thread panicked");
            Ok(0)
        }
    };
    debug!("Bar: both threads joined");

    match (outcome, dispatch) {
        (Err(e), _) => Err(e),
        (Ok(()), Err(e)) => Err(e).context("Event dispatch failed"),
        (Ok(()), Ok(handled)) => {
            info!("Bar: stopped cleanly after {} events", handled);
            Ok(())
        }
    }
}
