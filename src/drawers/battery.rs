// src/drawers/battery.rs

//! Battery charge from the kernel's power-supply class.
//!
//! Not enabled by default: desktops have no battery, and a missing device
//! fails construction.

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paint;
use crate::canvas::{CanvasView, Rect};
use crate::color::{Color, NamedColor};
use crate::drawer::Drawer;
use crate::state::State;

pub const NAME: &str = "battery";

const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BatterySettings {
    /// Power-supply directory name, e.g. `BAT0`. Autodetected when unset.
    device: Option<String>,
    /// Capacity (percent) at or below which the low color is used.
    low_threshold: u8,
    color: Option<Color>,
    low_color: Color,
}

impl Default for BatterySettings {
    fn default() -> Self {
        BatterySettings {
            device: None,
            low_threshold: 15,
            color: None,
            low_color: Color::Named(NamedColor::BrightRed),
        }
    }
}

pub struct Battery {
    capacity_path: PathBuf,
    low_threshold: u8,
    color: Color,
    low_color: Color,
    padding_px: u32,
}

pub fn new(state: &State) -> Result<Box<dyn Drawer>> {
    let settings: BatterySettings = state.drawer_settings(NAME)?;
    let root = Path::new(POWER_SUPPLY_ROOT);
    let device = match settings.device {
        Some(name) => root.join(name),
        None => find_battery(root)?,
    };
    info!("battery: reading {}", device.display());
    Ok(Box::new(Battery {
        capacity_path: device.join("capacity"),
        low_threshold: settings.low_threshold,
        color: settings.color.unwrap_or(state.config.appearance.foreground),
        low_color: settings.low_color,
        padding_px: state.resolution.pixels(1).max(0) as u32,
    }))
}

/// First power supply (in name order) whose `type` is `Battery`.
fn find_battery(root: &Path) -> Result<PathBuf> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("Failed to list {}", root.display()))?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    candidates.sort();
    for candidate in candidates {
        let kind = std::fs::read_to_string(candidate.join("type")).unwrap_or_default();
        if kind.trim() == "Battery" {
            return Ok(candidate);
        }
    }
    bail!("no battery found under {}", root.display())
}

fn parse_capacity(contents: &str) -> Result<u8> {
    let value: u8 = contents
        .trim()
        .parse()
        .map_err(|_| anyhow!("malformed capacity '{}'", contents.trim()))?;
    Ok(value.min(100))
}

impl Drawer for Battery {
    fn draw(&mut self, view: &mut CanvasView<'_>) -> Result<()> {
        let contents = std::fs::read_to_string(&self.capacity_path)
            .with_context(|| format!("Failed to read {}", self.capacity_path.display()))?;
        let capacity = parse_capacity(&contents)?;
        let color = if capacity <= self.low_threshold {
            self.low_color
        } else {
            self.color
        };

        let text = format!("{}%", capacity);
        let text_end = paint::draw_label(view, self.padding_px, &text, color);

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
            paint::draw_gauge(view, area, f64::from(capacity) / 100.0, color);
        }
        Ok(())
    }
}
