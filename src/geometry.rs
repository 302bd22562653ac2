// src/geometry.rs

//! Window placement and screen-edge reservation for the bar.

use thiserror::Error;

use crate::config::Edge;
use crate::output::OutputInfo;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("bar height {height}px is not positive")]
    NonPositiveHeight { height: i32 },
    #[error("bar height {height}px does not fit on output {output} ({available}px tall)")]
    TallerThanOutput {
        height: i32,
        output: String,
        available: u16,
    },
}

/// Space reserved along the root window's edges, in the layout of
/// `_NET_WM_STRUT_PARTIAL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Strut {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
    pub left_start_y: u32,
    pub left_end_y: u32,
    pub right_start_y: u32,
    pub right_end_y: u32,
    pub top_start_x: u32,
    pub top_end_x: u32,
    pub bottom_start_x: u32,
    pub bottom_end_x: u32,
}

impl Strut {
    /// Twelve cardinals for `_NET_WM_STRUT_PARTIAL`.
    pub fn partial(&self) -> [u32; 12] {
        [
            self.left,
            self.right,
            self.top,
            self.bottom,
            self.left_start_y,
            self.left_end_y,
            self.right_start_y,
            self.right_end_y,
            self.top_start_x,
            self.top_end_x,
            self.bottom_start_x,
            self.bottom_end_x,
        ]
    }

    /// Four cardinals for the older `_NET_WM_STRUT`.
    pub fn legacy(&self) -> [u32; 4] {
        [self.left, self.right, self.top, self.bottom]
    }
}

/// Where the bar window goes on the root window and what it reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub strut: Strut,
}

impl BarGeometry {
    /// Spans the full width of `output` along `edge`, `height` pixels tall.
    ///
    /// Strut offsets are measured from the root window's edges, so an output
    /// that does not touch the root's bottom edge reserves the gap below it
    /// as well.
    pub fn new(
        output: &OutputInfo,
        root_height: u32,
        height: i32,
        edge: Edge,
    ) -> Result<Self, GeometryError> {
        if height <= 0 {
            return Err(GeometryError::NonPositiveHeight { height });
        }
        if height > i32::from(output.height_px) {
            return Err(GeometryError::TallerThanOutput {
                height,
                output: output.name.clone(),
                available: output.height_px,
            });
        }
        let bar_height = height as u32;
        let width = u32::from(output.width_px);
        let start_x = output.x.max(0) as u32;
        let end_x = (start_x + width).saturating_sub(1);

        let (y, strut) = match edge {
            Edge::Bottom => {
                let output_bottom = output.y + i32::from(output.height_px);
                let gap_below = (root_height as i64 - output_bottom as i64).max(0) as u32;
                (
                    output_bottom - height,
                    Strut {
                        bottom: gap_below + bar_height,
                        bottom_start_x: start_x,
                        bottom_end_x: end_x,
                        ..Strut::default()
                    },
                )
            }
            Edge::Top => (
                output.y,
                Strut {
                    top: output.y.max(0) as u32 + bar_height,
                    top_start_x: start_x,
                    top_end_x: end_x,
                    ..Strut::default()
                },
            ),
        };

        Ok(BarGeometry {
            x: output.x,
            y,
            width,
            height: bar_height,
            strut,
        })
    }
}
