// SPDX-License-Identifier: GPL-3.0-only

//! Video output driver manager
//!
//! The manager provides:
//! - Driver selection from a user list with fallback
//! - Config bookkeeping
//! - Routing of whole images to `DrawImage`, `draw_slice` or `draw_frame`
//! - Teardown on drop

use super::types::*;
use super::{DriverEntry, VideoOutput, registry};
use crate::media::{ImageFlags, MpImage};
use tracing::{debug, info, warn};

/// Owns the active video output driver
pub struct VideoOutManager {
    drivers: Vec<DriverEntry>,
    active: Option<Box<dyn VideoOutput>>,
    config_count: u32,
}

impl VideoOutManager {
    /// Create a manager over the built-in driver registry
    pub fn new() -> Self {
        Self::with_registry(registry())
    }

    /// Create a manager over a custom set of drivers
    pub fn with_registry(drivers: Vec<DriverEntry>) -> Self {
        Self {
            drivers,
            active: None,
            config_count: 0,
        }
    }

    /// Initialize the first usable driver of `list`
    ///
    /// `list` is `name[:subopts],name2[:subopts],...`. Unknown names are
    /// skipped and a driver whose `preinit` fails hands over to the next one.
    /// An empty entry (for instance a trailing `,`) or an empty list means
    /// "then try every autoprobe driver".
    ///
    /// # Returns
    /// * `Ok(&VoInfo)` - The driver now active
    /// * `Err(VoError::NoUsableDriver)` - Nothing could be initialized
    pub fn init_best(&mut self, list: &str) -> VoResult<&'static VoInfo> {
        self.uninit();

        let mut autoprobe = list.trim().is_empty();
        if !autoprobe {
            for entry in list.split(',') {
                if entry.is_empty() {
                    autoprobe = true;
                    break;
                }
                let (name, subopts) = entry.split_once(':').unwrap_or((entry, ""));
                let Some(driver) = self.drivers.iter().find(|d| d.info.short_name == name).copied() else {
                    warn!(driver = %name, "Unknown video output driver");
                    continue;
                };
                if let Some(info) = self.try_driver(driver, subopts) {
                    return Ok(info);
                }
            }
        }

        if autoprobe {
            let candidates: Vec<DriverEntry> = self.drivers.iter().filter(|d| d.info.autoprobe).copied().collect();
            for driver in candidates {
                if let Some(info) = self.try_driver(driver, "") {
                    return Ok(info);
                }
            }
        }

        Err(VoError::NoUsableDriver)
    }

    fn try_driver(&mut self, driver: DriverEntry, subopts: &str) -> Option<&'static VoInfo> {
        let mut vo = (driver.create)();
        match vo.preinit(subopts) {
            Ok(()) => {
                info!(driver = %driver.info.short_name, name = %driver.info.name, "Video output initialized");
                self.active = Some(vo);
                self.config_count = 0;
                Some(driver.info)
            }
            Err(e) => {
                debug!(driver = %driver.info.short_name, error = %e, "Video output preinit failed");
                None
            }
        }
    }

    /// Description of the active driver
    pub fn active(&self) -> Option<&'static VoInfo> {
        self.active.as_ref().map(|vo| vo.info())
    }

    fn driver(&mut self) -> VoResult<&mut Box<dyn VideoOutput>> {
        self.active.as_mut().ok_or(VoError::NoActiveDriver)
    }

    /// Configure the active driver; counts successful calls
    pub fn config(&mut self, cfg: &VoConfig) -> VoResult<()> {
        info!(
            width = cfg.width,
            height = cfg.height,
            format = %cfg.format,
            fps = %cfg.fps,
            "Configuring video output"
        );
        self.driver()?.config(cfg)?;
        self.config_count += 1;
        Ok(())
    }

    /// Number of successful `config` calls since the driver was selected
    pub fn config_count(&self) -> u32 {
        self.config_count
    }

    pub fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
        self.driver()?.control(req)
    }

    /// Capabilities of the active driver for `format`
    pub fn query_format(&mut self, format: crate::media::ImgFmt) -> VoResult<VfCaps> {
        Ok(self.control(Control::QueryFormat(format))?.caps())
    }

    /// Hand a whole image to the driver
    ///
    /// `DrawImage` is tried first. When the driver does not take it, planar
    /// images go through `draw_slice` as one full-height slice and packed
    /// images through `draw_frame`.
    pub fn draw_image(&mut self, image: &MpImage) -> VoResult<()> {
        let vo = self.driver()?;
        if vo.control(Control::DrawImage(image))? == ControlReply::True {
            return Ok(());
        }
        let planes = image.plane_slices();
        if image.flags().contains(ImageFlags::PLANAR) {
            let strides = image.strides();
            vo.draw_slice(&planes, &strides, image.width, image.height, 0, 0)
        } else {
            vo.draw_frame(&planes)
        }
    }

    pub fn draw_slice(&mut self, planes: &[&[u8]], strides: &[usize], w: u32, h: u32, x: u32, y: u32) -> VoResult<()> {
        self.driver()?.draw_slice(planes, strides, w, h, x, y)
    }

    pub fn draw_osd(&mut self, osd: &OsdState) {
        if let Some(vo) = self.active.as_mut() {
            vo.draw_osd(osd);
        }
    }

    pub fn flip_page(&mut self) -> VoResult<()> {
        self.driver()?.flip_page()
    }

    pub fn check_events(&mut self) -> VoResult<Vec<VoEvent>> {
        self.driver()?.check_events()
    }

    /// Shut the active driver down
    pub fn uninit(&mut self) {
        if let Some(mut vo) = self.active.take() {
            info!(driver = %vo.info().short_name, "Closing video output");
            vo.uninit();
        }
        self.config_count = 0;
    }
}

impl Default for VideoOutManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VideoOutManager {
    fn drop(&mut self) {
        self.uninit();
    }
}

impl std::fmt::Debug for VideoOutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoOutManager")
            .field("active", &self.active().map(|i| i.short_name))
            .field("config_count", &self.config_count)
            .finish()
    }
}
