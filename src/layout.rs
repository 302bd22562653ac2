// src/layout.rs

//! Splits the bar canvas into equal-width, full-height slices and lets each
//! drawer paint its own slice, left to right.
//!
//! Slice width is `floor(width / count)`. The remainder is never
//! redistributed: the rightmost `width % count` columns stay background so
//! slice boundaries do not shift when the drawer count changes parity.

use log::trace;
use thiserror::Error;

use crate::canvas::{Canvas, Rect};
use crate::drawer::LoadedDrawer;

#[derive(Debug, Error)]
pub enum LayoutError {
    /// Slice arithmetic produced an empty or unusable region.
    #[error("buggy shape math: slice {index} of {count} is {slice} on a {canvas_width}x{canvas_height} canvas")]
    Degenerate {
        index: usize,
        count: usize,
        slice: Rect,
        canvas_width: u32,
        canvas_height: u32,
    },
    #[error("drawer '{name}' (slice {index}, {slice}) failed")]
    Drawer {
        name: String,
        index: usize,
        slice: Rect,
        #[source]
        source: anyhow::Error,
    },
}

/// Computes the slice for each of `count` drawers on a `width` x `height`
/// canvas.
///
/// Any zero-sized slice (for example, more drawers than pixel columns) is an
/// error rather than a silently blank bar.
pub fn slices(width: u32, height: u32, count: usize) -> Result<Vec<Rect>, LayoutError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    // A count beyond u32 can only mean zero-width slices.
    let slice_width = u32::try_from(count).map_or(0, |n| width / n);
    (0..count)
        .map(|index| {
            let slice = Rect::new(index as u32 * slice_width, 0, slice_width, height);
            if slice.is_empty() {
                Err(LayoutError::Degenerate {
                    index,
                    count,
                    slice,
                    canvas_width: width,
                    canvas_height: height,
                })
            } else {
                Ok(slice)
            }
        })
        .collect()
}

/// Runs every drawer over its slice of `canvas`, in order.
///
/// Stops at the first failure; drawers after the failing one are not
/// invoked and the partially painted canvas must not be presented.
pub fn compose(canvas: &mut Canvas, drawers: &mut [LoadedDrawer]) -> Result<(), LayoutError> {
    let (width, height) = (canvas.width(), canvas.height());
    let count = drawers.len();
    let regions = slices(width, height, count)?;

    for (index, (drawer, slice)) in drawers.iter_mut().zip(regions).enumerate() {
        let mut view = canvas.view(slice).ok_or(LayoutError::Degenerate {
            index,
            count,
            slice,
            canvas_width: width,
            canvas_height: height,
        })?;
        trace!("Drawing '{}' into {}", drawer.name(), slice);
        drawer
            .draw(&mut view)
            .map_err(|source| LayoutError::Drawer {
                name: drawer.name().to_string(),
                index,
                slice,
                source,
            })?;
    }
    Ok(())
}
