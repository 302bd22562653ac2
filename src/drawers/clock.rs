// src/drawers/clock.rs

//! Local wall-clock time.

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use serde::Deserialize;

use super::paint;
use crate::canvas::CanvasView;
use crate::color::Color;
use crate::drawer::Drawer;
use crate::state::State;

pub const NAME: &str = "clock";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ClockSettings {
    /// Show seconds (`HH:MM:SS`) or not (`HH:MM`).
    seconds: bool,
    color: Option<Color>,
}

impl Default for ClockSettings {
    fn default() -> Self {
        ClockSettings {
            seconds: true,
            color: None,
        }
    }
}

pub struct Clock {
    format: &'static str,
    color: Color,
    padding_px: u32,
}

pub fn new(state: &State) -> Result<Box<dyn Drawer>> {
    Ok(Box::new(Clock::from_state(state)?))
}

impl Clock {
    fn from_state(state: &State) -> Result<Self> {
        let settings: ClockSettings = state.drawer_settings(NAME)?;
        Ok(Clock {
            format: if settings.seconds { "%H:%M:%S" } else { "%H:%M" },
            color: settings.color.unwrap_or(state.config.appearance.foreground),
            padding_px: state.resolution.pixels(1).max(0) as u32,
        })
    }

    fn label<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        now.format(self.format).to_string()
    }
}

impl Drawer for Clock {
    fn draw(&mut self, view: &mut CanvasView<'_>) -> Result<()> {
        let text = self.label(&Local::now());
        paint::draw_label(view, self.padding_px, &text, self.color);
        Ok(())
    }
}
