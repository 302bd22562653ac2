// src/drawers/load.rs

//! One-minute load average, shown as a number and a gauge scaled to the
//! number of CPUs.

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::Deserialize;
use std::path::PathBuf;

use super::paint;
use crate::canvas::{CanvasView, Rect};
use crate::color::Color;
use crate::drawer::Drawer;
use crate::state::State;

pub const NAME: &str = "load";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LoadSettings {
    path: PathBuf,
    color: Option<Color>,
}

impl Default for LoadSettings {
    fn default() -> Self {
        LoadSettings {
            path: PathBuf::from("/proc/loadavg"),
            color: None,
        }
    }
}

pub struct Load {
    path: PathBuf,
    cpus: f64,
    color: Color,
    padding_px: u32,
}

pub fn new(state: &State) -> Result<Box<dyn Drawer>> {
    let settings: LoadSettings = state.drawer_settings(NAME)?;
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    debug!("load: scaling gauge to {} CPU(s)", cpus);
    Ok(Box::new(Load {
        path: settings.path,
        cpus: cpus as f64,
        color: settings.color.unwrap_or(state.config.appearance.foreground),
        padding_px: state.resolution.pixels(1).max(0) as u32,
    }))
}

/// Parses the first field of a `/proc/loadavg` line.
fn parse_loadavg(contents: &str) -> Result<f64> {
    let field = contents
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("empty loadavg"))?;
    field
        .parse::<f64>()
        .with_context(|| format!("malformed loadavg field '{}'", field))
}

impl Drawer for Load {
    fn draw(&mut self, view: &mut CanvasView<'_>) -> Result<()> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let load = parse_loadavg(&contents)?;

        let text = format!("{:.2}", load);
        let text_end = paint::draw_label(view, self.padding_px, &text, self.color);

        let gauge_x = text_end + self.padding_px;
        let right = view.width().saturating_sub(self.padding_px);
        if right > gauge_x {
            let inset = view.height() / 4;
            let area = Rect::new(
                gauge_x,
                inset,
                right - gauge_x,
                view.height().saturating_sub(2 * inset),
            );
            paint::draw_gauge(view, area, load / self.cpus, self.color);
        }
        Ok(())
    }
}
