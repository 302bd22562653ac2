// src/output.rs

//! Picks the monitor the bar lives on.
//!
//! The primary output is tried first, then every output in the order the
//! server reports them. An output whose physical height is zero millimeters
//! has nothing plugged in and is skipped; any other query failure aborts the
//! search.

use log::{debug, info};
use thiserror::Error;

use crate::display::{DisplayError, OutputId, OutputTopology};

/// The chosen output's geometry, in root-window pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width_px: u16,
    pub height_px: u16,
    pub height_mm: u32,
}

#[derive(Debug, Error)]
pub enum SelectError {
    /// The output reports zero physical height. Recoverable: the selector
    /// moves on to the next candidate.
    #[error("output {0:#x} is unplugged")]
    Unplugged(OutputId),
    #[error("querying output {output:#x}")]
    Query {
        output: OutputId,
        #[source]
        source: DisplayError,
    },
    #[error("cannot find any plugged-in output")]
    NoUsableOutput,
}

/// Returns the first plugged-in candidate, primary output first.
pub fn select_output<T>(topology: &T) -> Result<OutputInfo, SelectError>
where
    T: OutputTopology + ?Sized,
{
    let primary = topology
        .primary_output()
        .map_err(|source| SelectError::Query { output: 0, source })?;
    let listed = topology
        .outputs()
        .map_err(|source| SelectError::Query { output: 0, source })?;

    let candidates = primary
        .filter(|&id| id != 0)
        .into_iter()
        .chain(listed);

    for output in candidates {
        match probe(topology, output) {
            Ok(info) => {
                info!(
                    "Output: using {} ({}x{}+{}+{}, {}mm tall)",
                    info.name, info.width_px, info.height_px, info.x, info.y, info.height_mm
                );
                return Ok(info);
            }
            Err(SelectError::Unplugged(id)) => {
                debug!("Output: skipping {:#x}, nothing plugged in", id);
            }
            Err(e) => return Err(e),
        }
    }
    Err(SelectError::NoUsableOutput)
}

/// Queries one output, classifying a zero physical height as unplugged.
fn probe<T>(topology: &T, output: OutputId) -> Result<OutputInfo, SelectError>
where
    T: OutputTopology + ?Sized,
{
    let query = |source| SelectError::Query { output, source };

    let descriptor = topology.output_descriptor(output).map_err(query)?;
    if descriptor.height_mm == 0 {
        return Err(SelectError::Unplugged(output));
    }
    let crtc = descriptor.crtc.ok_or_else(|| {
        query(DisplayError::Query {
            call: "XRRGetOutputInfo (no active CRTC)",
            id: output,
        })
    })?;
    let geometry = topology.crtc_geometry(crtc).map_err(query)?;

    let fit = |value: u32, what: &str| {
        u16::try_from(value).map_err(|_| {
            query(DisplayError::Geometry(format!(
                "{} {} of CRTC {:#x} exceeds 16 bits",
                what, value, crtc
            )))
        })
    };
    Ok(OutputInfo {
        name: descriptor.name,
        x: geometry.x,
        y: geometry.y,
        width_px: fit(geometry.width, "width")?,
        height_px: fit(geometry.height, "height")?,
        height_mm: descriptor.height_mm,
    })
}
