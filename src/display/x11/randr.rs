// src/display/x11/randr.rs

//! `OutputTopology` over the RandR extension.

use log::{debug, trace};
use std::ffi::CStr;
use std::ptr::NonNull;

use libc::c_int;
use x11::xrandr;

use super::Connection;
use crate::display::{
    CrtcGeometry, CrtcId, DisplayError, OutputDescriptor, OutputId, OutputTopology,
};

/// Snapshot of the screen's RandR resources; freed on drop.
pub struct RandrTopology<'a> {
    conn: &'a Connection,
    resources: NonNull<xrandr::XRRScreenResources>,
}

impl<'a> RandrTopology<'a> {
    pub fn new(conn: &'a Connection) -> Result<Self, DisplayError> {
        let display = conn.display();
        let (mut event_base, mut error_base): (c_int, c_int) = (0, 0);
        let present =
            unsafe { xrandr::XRRQueryExtension(display, &mut event_base, &mut error_base) };
        if present == 0 {
            return Err(DisplayError::MissingExtension("RANDR"));
        }

        let raw = unsafe { xrandr::XRRGetScreenResourcesCurrent(display, conn.root()) };
        let resources = NonNull::new(raw).ok_or(DisplayError::Query {
            call: "XRRGetScreenResourcesCurrent",
            id: conn.root(),
        })?;
        debug!(
            "RandR: {} outputs, {} CRTCs",
            unsafe { resources.as_ref().noutput },
            unsafe { resources.as_ref().ncrtc }
        );
        Ok(RandrTopology { conn, resources })
    }
}

impl Drop for RandrTopology<'_> {
    fn drop(&mut self) {
        unsafe { xrandr::XRRFreeScreenResources(self.resources.as_ptr()) };
    }
}

/// Frees an `XRRGetOutputInfo` reply when dropped.
struct OutputInfoReply(NonNull<xrandr::XRROutputInfo>);

impl Drop for OutputInfoReply {
    fn drop(&mut self) {
        unsafe { xrandr::XRRFreeOutputInfo(self.0.as_ptr()) };
    }
}

/// Frees an `XRRGetCrtcInfo` reply when dropped.
struct CrtcInfoReply(NonNull<xrandr::XRRCrtcInfo>);

impl Drop for CrtcInfoReply {
    fn drop(&mut self) {
        unsafe { xrandr::XRRFreeCrtcInfo(self.0.as_ptr()) };
    }
}

impl OutputTopology for RandrTopology<'_> {
    fn primary_output(&self) -> Result<Option<OutputId>, DisplayError> {
        let primary =
            unsafe { xrandr::XRRGetOutputPrimary(self.conn.display(), self.conn.root()) };
        self.conn.check("XRRGetOutputPrimary")?;
        trace!("RandR: primary output {:#x}", primary);
        Ok((primary != 0).then_some(primary))
    }

    fn outputs(&self) -> Result<Vec<OutputId>, DisplayError> {
        let resources = unsafe { self.resources.as_ref() };
        if resources.noutput <= 0 || resources.outputs.is_null() {
            return Ok(Vec::new());
        }
        let outputs = unsafe {
            std::slice::from_raw_parts(resources.outputs, resources.noutput as usize)
        };
        Ok(outputs.to_vec())
    }

    fn output_descriptor(&self, output: OutputId) -> Result<OutputDescriptor, DisplayError> {
        let raw = unsafe {
            xrandr::XRRGetOutputInfo(self.conn.display(), self.resources.as_ptr(), output)
        };
        let reply = NonNull::new(raw).map(OutputInfoReply);
        self.conn.check("XRRGetOutputInfo")?;
        let reply = reply.ok_or(DisplayError::Query {
            call: "XRRGetOutputInfo",
            id: output,
        })?;
        let info = unsafe { reply.0.as_ref() };

        let name = if info.name.is_null() {
            format!("output-{:#x}", output)
        } else {
            unsafe { CStr::from_ptr(info.name) }
                .to_string_lossy()
                .into_owned()
        };
        let height_mm = u32::try_from(info.mm_height).map_err(|_| {
            DisplayError::Geometry(format!("{} reports {}mm height", name, info.mm_height))
        })?;
        trace!(
            "RandR: output {:#x} '{}' {}mm crtc {:#x}",
            output,
            name,
            height_mm,
            info.crtc
        );
        Ok(OutputDescriptor {
            name,
            height_mm,
            crtc: (info.crtc != 0).then_some(info.crtc),
        })
    }

    fn crtc_geometry(&self, crtc: CrtcId) -> Result<CrtcGeometry, DisplayError> {
        let raw = unsafe {
            xrandr::XRRGetCrtcInfo(self.conn.display(), self.resources.as_ptr(), crtc)
        };
        let reply = NonNull::new(raw).map(CrtcInfoReply);
        self.conn.check("XRRGetCrtcInfo")?;
        let reply = reply.ok_or(DisplayError::Query {
            call: "XRRGetCrtcInfo",
            id: crtc,
        })?;
        let info = unsafe { reply.0.as_ref() };
        Ok(CrtcGeometry {
            x: info.x,
            y: info.y,
            width: info.width,
            height: info.height,
        })
    }
}
