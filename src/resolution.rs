// src/resolution.rs

//! Pixel density of the chosen output.

/// Pixels per millimeter of the output the bar lives on.
///
/// Built once from the output's vertical pixel and millimeter extents and
/// shared read-only for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pixels_per_millimeter: f64,
}

impl Resolution {
    /// Computes the density from a screen height.
    ///
    /// `height_mm` must be non-zero; outputs reporting zero millimeters are
    /// treated as unplugged by the output selector and never reach here.
    pub fn new(height_px: u16, height_mm: u32) -> Self {
        debug_assert!(height_mm > 0, "resolution needs a physical height");
        Resolution {
            pixels_per_millimeter: f64::from(height_px) / f64::from(height_mm),
        }
    }

    pub fn pixels_per_millimeter(&self) -> f64 {
        self.pixels_per_millimeter
    }

    /// How many pixels `millimeters` covers, rounded to the nearest pixel.
    pub fn pixels(&self, millimeters: u32) -> i32 {
        (self.pixels_per_millimeter * f64::from(millimeters)).round() as i32
    }
}
