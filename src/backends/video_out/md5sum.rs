// SPDX-License-Identifier: GPL-3.0-only

//! MD5 checksum output
//!
//! Writes one `"{md5}  frame%08d"` line per frame, hashing only the visible
//! bytes of each plane (Y, then U, then V for planar YUV).

use super::subopt::{OptSpec, SubOptions};
use super::types::*;
use super::{VideoOutput, check_geometry};
use crate::constants::stream_sink::DEFAULT_MD5_FILE;
use crate::media::{ImgFmt, MpImage};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

pub static INFO: VoInfo = VoInfo {
    name: "md5sum of each frame",
    short_name: "md5sum",
    author: "vidout",
    comment: "Regression testing of decoders",
    autoprobe: false,
};

const SUBOPTS: &[OptSpec] = &[OptSpec::string("outfile")];

#[derive(Debug)]
pub struct Md5SumOutput {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    config: Option<VoConfig>,
    /// Frame assembled from slices, hashed on `flip_page`
    pending: Option<MpImage>,
    frame_num: u32,
}

impl Md5SumOutput {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MD5_FILE),
            out: None,
            config: None,
            pending: None,
            frame_num: 0,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Lines written since the last `uninit`
    pub fn frames_written(&self) -> u32 {
        self.frame_num
    }

    fn accepts(format: ImgFmt) -> bool {
        format == ImgFmt::RGB24 || format.is_yuv420p()
    }

    fn write_sum(&mut self, image: &MpImage) -> VoResult<()> {
        check_geometry(self.config.as_ref(), image)?;
        let Some(out) = self.out.as_mut() else {
            return Err(VoError::NotConfigured);
        };
        let frame = self.frame_num + 1;
        let sum = image_md5(image);
        writeln!(out, "{sum}  frame{frame:08}")
            .and_then(|()| out.flush())
            .map_err(|e| VoError::file(&self.path, e))?;
        self.frame_num = frame;
        debug!(frame = self.frame_num, md5 = %sum, "Frame hashed");
        Ok(())
    }
}

impl Default for Md5SumOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Hex MD5 of an image's visible bytes, plane by plane
pub fn image_md5(image: &MpImage) -> String {
    let mut hasher = Md5::new();
    for plane in 0..image.planes.len() {
        for row in image.rows(plane) {
            hasher.update(row);
        }
    }
    format!("{:x}", hasher.finalize())
}

impl VideoOutput for Md5SumOutput {
    fn info(&self) -> &'static VoInfo {
        &INFO
    }

    fn preinit(&mut self, subopts: &str) -> VoResult<()> {
        let opts = SubOptions::parse(subopts, SUBOPTS).map_err(|source| VoError::SubOption {
            driver: INFO.short_name,
            source,
        })?;
        self.path = PathBuf::from(opts.string("outfile").unwrap_or(DEFAULT_MD5_FILE));
        Ok(())
    }

    fn config(&mut self, cfg: &VoConfig) -> VoResult<()> {
        if !Self::accepts(cfg.format) {
            return Err(VoError::FormatNotSupported(cfg.format));
        }
        if self.out.is_none() {
            let file = File::create(&self.path).map_err(|e| VoError::file(&self.path, e))?;
            info!(path = %self.path.display(), "Writing md5sums");
            self.out = Some(BufWriter::new(file));
        }
        self.config = Some(cfg.clone());
        self.pending = None;
        Ok(())
    }

    fn uninit(&mut self) {
        if let Some(mut out) = self.out.take() {
            let _ = out.flush();
        }
        self.config = None;
        self.pending = None;
        self.frame_num = 0;
    }

    fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
        match req {
            Control::QueryFormat(format) if Self::accepts(format) => {
                Ok(ControlReply::Caps(VfCaps::CSP_SUPPORTED | VfCaps::CSP_SUPPORTED_BY_HW))
            }
            Control::QueryFormat(_) => Ok(ControlReply::Caps(VfCaps::empty())),
            Control::DrawImage(image) if Self::accepts(image.format) => {
                self.write_sum(image)?;
                Ok(ControlReply::True)
            }
            Control::DrawImage(_) => Ok(ControlReply::False),
            _ => Ok(ControlReply::NotImpl),
        }
    }

    fn draw_frame(&mut self, planes: &[&[u8]]) -> VoResult<()> {
        let Some(cfg) = self.config.clone() else {
            return Err(VoError::NotConfigured);
        };
        let owned = planes.iter().map(|p| p.to_vec()).collect();
        let image = MpImage::from_packed_planes(cfg.format, cfg.width, cfg.height, owned)
            .ok_or_else(|| VoError::InvalidFrame("frame does not match the configured format".into()))?;
        self.write_sum(&image)
    }

    fn draw_slice(&mut self, planes: &[&[u8]], strides: &[usize], w: u32, h: u32, x: u32, y: u32) -> VoResult<()> {
        let Some(cfg) = self.config.as_ref() else {
            return Err(VoError::NotConfigured);
        };
        let pending = self
            .pending
            .get_or_insert_with(|| MpImage::new(cfg.format, cfg.width, cfg.height));
        pending
            .copy_slice(planes, strides, w, h, x, y)
            .map_err(|e| VoError::InvalidFrame(e.to_string()))
    }

    fn flip_page(&mut self) -> VoResult<()> {
        if let Some(image) = self.pending.take() {
            self.write_sum(&image)?;
        }
        Ok(())
    }
}
