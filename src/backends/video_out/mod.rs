// SPDX-License-Identifier: GPL-3.0-only

//! Video output abstraction
//!
//! Every output driver implements [`VideoOutput`]. The player (or the
//! render loop in this crate) talks to drivers only through this trait,
//! usually via [`VideoOutManager`], which picks a driver from a user list
//! and routes whole images to the cheapest entry point the driver offers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │     Render loop     │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   VideoOutManager   │  ← Driver selection, draw routing, teardown
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  VideoOutput trait  │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!  tct  null  yuv4mpeg  png  jpeg  pnm  md5sum
//! ```
//!
//! # Call order
//!
//! `preinit` once, then `config` (possibly again on size changes), then per
//! frame: `draw_image` (through `control`) or `draw_slice`/`draw_frame`,
//! `draw_osd`, `flip_page`, `check_events`. `uninit` releases everything.

pub mod image_file;
pub mod manager;
pub mod md5sum;
pub mod null;
pub mod pnm;
pub mod subopt;
pub mod tct;
pub mod types;
pub mod yuv4mpeg;

pub use manager::VideoOutManager;
pub use subopt::{IntCheck, OptSpec, SubOptError, SubOptions};
pub use types::*;

/// Video output driver interface
pub trait VideoOutput {
    // ===== Identity =====

    /// Static description of the driver
    fn info(&self) -> &'static VoInfo;

    // ===== Lifecycle =====

    /// Parse sub-options and check the driver can run here
    ///
    /// # Arguments
    /// * `subopts` - Everything after the first `:` of the driver list entry
    ///
    /// # Returns
    /// * `Ok(())` - Driver is usable
    /// * `Err(VoError)` - Try the next driver in the list
    fn preinit(&mut self, subopts: &str) -> VoResult<()>;

    /// Set up output for a stream of the given size and format
    fn config(&mut self, cfg: &VoConfig) -> VoResult<()>;

    /// Release every resource; the driver may be preinit again afterwards
    fn uninit(&mut self);

    // ===== Control =====

    /// Format queries, whole-image drawing, pause/resume, equalizers
    fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply>;

    // ===== Drawing =====

    /// Draw a complete packed frame
    fn draw_frame(&mut self, planes: &[&[u8]]) -> VoResult<()>;

    /// Draw a horizontal band of a planar image
    ///
    /// # Arguments
    /// * `planes` - One buffer per plane, each starting at the band's first row
    /// * `strides` - Bytes per row for each buffer
    /// * `w`, `h`, `x`, `y` - Band geometry in luma pixels
    fn draw_slice(&mut self, planes: &[&[u8]], strides: &[usize], w: u32, h: u32, x: u32, y: u32) -> VoResult<()>;

    /// Blend the on-screen display into the pending frame
    fn draw_osd(&mut self, _osd: &OsdState) {}

    /// Present the pending frame
    fn flip_page(&mut self) -> VoResult<()>;

    // ===== Events =====

    /// Poll for input without blocking
    fn check_events(&mut self) -> VoResult<Vec<VoEvent>> {
        Ok(Vec::new())
    }
}

/// A registered driver
#[derive(Clone, Copy)]
pub struct DriverEntry {
    pub info: &'static VoInfo,
    pub create: fn() -> Box<dyn VideoOutput>,
}

impl std::fmt::Debug for DriverEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverEntry").field("info", self.info).finish()
    }
}

/// Every driver in priority order; autoprobe drivers first
pub fn registry() -> Vec<DriverEntry> {
    vec![
        DriverEntry {
            info: &tct::INFO,
            create: || Box::new(tct::TctOutput::new()),
        },
        DriverEntry {
            info: &null::INFO,
            create: || Box::new(null::NullOutput::new()),
        },
        DriverEntry {
            info: &yuv4mpeg::INFO,
            create: || Box::new(yuv4mpeg::Yuv4MpegOutput::new()),
        },
        DriverEntry {
            info: &image_file::PNG_INFO,
            create: || Box::new(image_file::ImageFileOutput::png()),
        },
        DriverEntry {
            info: &image_file::JPEG_INFO,
            create: || Box::new(image_file::ImageFileOutput::jpeg()),
        },
        DriverEntry {
            info: &pnm::INFO,
            create: || Box::new(pnm::PnmOutput::new()),
        },
        DriverEntry {
            info: &md5sum::INFO,
            create: || Box::new(md5sum::Md5SumOutput::new()),
        },
    ]
}

/// Look a driver up by its short name
pub fn find_driver(name: &str) -> Option<DriverEntry> {
    registry().into_iter().find(|entry| entry.info.short_name == name)
}

/// Instantiate a driver by its short name
pub fn create_driver(name: &str) -> VoResult<Box<dyn VideoOutput>> {
    find_driver(name)
        .map(|entry| (entry.create)())
        .ok_or_else(|| VoError::UnknownDriver(name.to_string()))
}

/// The driver listing: one `short_name  name` line per driver
pub fn list_drivers() -> String {
    registry()
        .iter()
        .map(|entry| format!("\t{}\t{}\n", entry.info.short_name, entry.info.name))
        .collect()
}

/// Validate plane geometry shared by the file sinks
pub(crate) fn check_geometry(cfg: Option<&VoConfig>, image: &crate::media::MpImage) -> VoResult<()> {
    let Some(cfg) = cfg else {
        return Err(VoError::NotConfigured);
    };
    if image.width != cfg.width || image.height != cfg.height {
        return Err(VoError::InvalidFrame(format!(
            "image is {}x{}, configured for {}x{}",
            image.width, image.height, cfg.width, cfg.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let names: Vec<&str> = registry().iter().map(|e| e.info.short_name).collect();
        assert_eq!(names, vec!["tct", "null", "yuv4mpeg", "png", "jpeg", "pnm", "md5sum"]);
        let autoprobe: Vec<&str> = registry()
            .iter()
            .filter(|e| e.info.autoprobe)
            .map(|e| e.info.short_name)
            .collect();
        assert_eq!(autoprobe, vec!["tct", "null"]);
    }

    #[test]
    fn test_create_driver() {
        assert_eq!(create_driver("null").unwrap().info().short_name, "null");
        assert!(matches!(create_driver("x11"), Err(VoError::UnknownDriver(_))));
    }

    #[test]
    fn test_list_drivers_mentions_every_driver() {
        let listing = list_drivers();
        assert_eq!(listing.lines().count(), registry().len());
        assert!(listing.contains("\tpnm\t"));
    }
}
