// src/color.rs

//! Color values used by the bar background and the bundled drawers.
//!
//! Colors are written in configuration either as `"#rrggbb"` or as one of the
//! sixteen ANSI color names (`"black"`, `"bright_blue"`, ...). They are packed
//! into the 32-bit `0x00RRGGBB` pixel layout of a 24-bit TrueColor visual,
//! which is what the canvas stores and what `XPutImage` expects on
//! little-endian hosts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Standard ANSI named colors (indices 0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

const NAMED_COLORS: [(&str, NamedColor); 16] = [
    ("black", NamedColor::Black),
    ("red", NamedColor::Red),
    ("green", NamedColor::Green),
    ("yellow", NamedColor::Yellow),
    ("blue", NamedColor::Blue),
    ("magenta", NamedColor::Magenta),
    ("cyan", NamedColor::Cyan),
    ("white", NamedColor::White),
    ("bright_black", NamedColor::BrightBlack),
    ("bright_red", NamedColor::BrightRed),
    ("bright_green", NamedColor::BrightGreen),
    ("bright_yellow", NamedColor::BrightYellow),
    ("bright_blue", NamedColor::BrightBlue),
    ("bright_magenta", NamedColor::BrightMagenta),
    ("bright_cyan", NamedColor::BrightCyan),
    ("bright_white", NamedColor::BrightWhite),
];

impl NamedColor {
    /// Configuration name of this color, e.g. `"bright_red"`.
    pub fn name(self) -> &'static str {
        NAMED_COLORS[self as usize].0
    }

    /// The sRGB components commonly used for this ANSI color.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            NamedColor::Black => (0, 0, 0),
            NamedColor::Red => (205, 0, 0),
            NamedColor::Green => (0, 205, 0),
            NamedColor::Yellow => (205, 205, 0),
            NamedColor::Blue => (0, 0, 238),
            NamedColor::Magenta => (205, 0, 205),
            NamedColor::Cyan => (0, 205, 205),
            NamedColor::White => (229, 229, 229),
            NamedColor::BrightBlack => (127, 127, 127),
            NamedColor::BrightRed => (255, 0, 0),
            NamedColor::BrightGreen => (0, 255, 0),
            NamedColor::BrightYellow => (255, 255, 0),
            NamedColor::BrightBlue => (92, 92, 255),
            NamedColor::BrightMagenta => (255, 0, 255),
            NamedColor::BrightCyan => (0, 255, 255),
            NamedColor::BrightWhite => (255, 255, 255),
        }
    }
}

/// A concrete color: either a named ANSI color or an RGB true color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    Named(NamedColor),
    Rgb(u8, u8, u8),
}

impl Color {
    /// Resolves the color to its RGB components.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Named(named) => named.to_rgb(),
            Color::Rgb(r, g, b) => (r, g, b),
        }
    }

    /// Packs the color as a `0x00RRGGBB` pixel value.
    pub fn to_pixel(self) -> u32 {
        let (r, g, b) = self.to_rgb();
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color '{0}' must be '#rrggbb' or an ANSI color name")]
    Unrecognized(String),
    #[error("color '{0}' has invalid hex digits")]
    InvalidHex(String),
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(ColorParseError::Unrecognized(s.to_string()));
            }
            let component = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map_err(|_| ColorParseError::InvalidHex(s.to_string()))
            };
            return Ok(Color::Rgb(component(0..2)?, component(2..4)?, component(4..6)?));
        }

        let lowered = trimmed.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, named)| Color::Named(*named))
            .ok_or_else(|| ColorParseError::Unrecognized(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Named(named) => f.write_str(named.name()),
            Color::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
        }
    }
}
