// SPDX-License-Identifier: GPL-3.0-only

//! YUV4MPEG2 stream output
//!
//! Writes the stream header on the first `flip_page`, then one `FRAME`
//! record per flip with the Y, U and V planes of the pending picture.

use super::subopt::{OptSpec, SubOptions};
use super::types::*;
use super::VideoOutput;
use crate::constants::stream_sink::DEFAULT_Y4M_FILE;
use crate::media::MpImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

pub static INFO: VoInfo = VoInfo {
    name: "yuv4mpeg output for mjpegtools",
    short_name: "yuv4mpeg",
    author: "vidout",
    comment: "Planar 4:2:0 stream for mjpegtools and encoders",
    autoprobe: false,
};

const SUBOPTS: &[OptSpec] = &[
    OptSpec::string("file"),
    OptSpec::flag("interlaced"),
    OptSpec::flag("interlaced_bf"),
];

/// Field order advertised in the stream header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interlacing {
    #[default]
    Progressive,
    TopFieldFirst,
    BottomFieldFirst,
}

impl Interlacing {
    pub fn tag(self) -> char {
        match self {
            Interlacing::Progressive => 'p',
            Interlacing::TopFieldFirst => 't',
            Interlacing::BottomFieldFirst => 'b',
        }
    }
}

#[derive(Debug)]
pub struct Yuv4MpegOutput {
    path: PathBuf,
    interlacing: Interlacing,
    out: Option<BufWriter<File>>,
    config: Option<VoConfig>,
    frame: Option<MpImage>,
    header_written: bool,
    frames: u64,
}

impl Yuv4MpegOutput {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_Y4M_FILE),
            interlacing: Interlacing::default(),
            out: None,
            config: None,
            frame: None,
            header_written: false,
            frames: 0,
        }
    }

    pub fn interlacing(&self) -> Interlacing {
        self.interlacing
    }

    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn write_frame(&mut self) -> VoResult<()> {
        let (Some(out), Some(cfg), Some(frame)) = (self.out.as_mut(), self.config.as_ref(), self.frame.as_ref()) else {
            return Err(VoError::NotConfigured);
        };
        let mut write = || -> std::io::Result<()> {
            if !self.header_written {
                out.write_all(stream_header(cfg, self.interlacing).as_bytes())?;
            }
            out.write_all(b"FRAME\n")?;
            for plane in 0..3 {
                for row in frame.rows(plane) {
                    out.write_all(row)?;
                }
            }
            out.flush()
        };
        write().map_err(|e| VoError::file(&self.path, e))?;
        self.header_written = true;
        self.frames += 1;
        Ok(())
    }
}

impl Default for Yuv4MpegOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// `YUV4MPEG2 W.. H.. F..:.. I. A..:..` line for a configuration
pub fn stream_header(cfg: &VoConfig, interlacing: Interlacing) -> String {
    let (sar_num, sar_den) = sample_aspect(cfg);
    format!(
        "YUV4MPEG2 W{} H{} F{}:{} I{} A{}:{}\n",
        cfg.width,
        cfg.height,
        cfg.fps.num,
        cfg.fps.denom,
        interlacing.tag(),
        sar_num,
        sar_den
    )
}

/// Pixel aspect from source and display sizes, `0:0` when unknown
fn sample_aspect(cfg: &VoConfig) -> (u64, u64) {
    if cfg.width == 0 || cfg.height == 0 || cfg.d_width == 0 || cfg.d_height == 0 {
        return (0, 0);
    }
    let num = u64::from(cfg.d_width) * u64::from(cfg.height);
    let den = u64::from(cfg.d_height) * u64::from(cfg.width);
    let g = gcd(num, den);
    (num / g, den / g)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

impl VideoOutput for Yuv4MpegOutput {
    fn info(&self) -> &'static VoInfo {
        &INFO
    }

    fn preinit(&mut self, subopts: &str) -> VoResult<()> {
        let opts = SubOptions::parse(subopts, SUBOPTS).map_err(|source| VoError::SubOption {
            driver: INFO.short_name,
            source,
        })?;
        self.path = PathBuf::from(opts.string("file").unwrap_or(DEFAULT_Y4M_FILE));
        self.interlacing = if opts.is_set("interlaced_bf") {
            Interlacing::BottomFieldFirst
        } else if opts.is_set("interlaced") {
            Interlacing::TopFieldFirst
        } else {
            Interlacing::Progressive
        };
        Ok(())
    }

    fn config(&mut self, cfg: &VoConfig) -> VoResult<()> {
        if !cfg.format.is_yuv420p() {
            return Err(VoError::FormatNotSupported(cfg.format));
        }
        if self.header_written
            && let Some(old) = &self.config
            && (old.width != cfg.width || old.height != cfg.height)
        {
            return Err(VoError::InvalidFrame(format!(
                "stream is {}x{}, cannot change to {}x{}",
                old.width, old.height, cfg.width, cfg.height
            )));
        }
        if self.out.is_none() {
            let file = File::create(&self.path).map_err(|e| VoError::file(&self.path, e))?;
            info!(path = %self.path.display(), interlacing = ?self.interlacing, "Writing yuv4mpeg stream");
            self.out = Some(BufWriter::new(file));
        }
        self.frame = Some(MpImage::new(cfg.format, cfg.width, cfg.height));
        self.config = Some(cfg.clone());
        Ok(())
    }

    fn uninit(&mut self) {
        if let Some(mut out) = self.out.take() {
            let _ = out.flush();
            debug!(frames = self.frames, "yuv4mpeg stream closed");
        }
        self.config = None;
        self.frame = None;
        self.header_written = false;
        self.frames = 0;
    }

    fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
        match req {
            Control::QueryFormat(format) if format.is_yuv420p() => {
                Ok(ControlReply::Caps(VfCaps::CSP_SUPPORTED | VfCaps::CSP_SUPPORTED_BY_HW | VfCaps::ACCEPT_STRIDE))
            }
            Control::QueryFormat(_) => Ok(ControlReply::Caps(VfCaps::empty())),
            Control::DrawImage(image) => {
                let Some(frame) = self.frame.as_mut() else {
                    return Err(VoError::NotConfigured);
                };
                if image.format != frame.format || image.width != frame.width || image.height != frame.height {
                    return Ok(ControlReply::False);
                }
                frame.clone_from(image);
                Ok(ControlReply::True)
            }
            _ => Ok(ControlReply::NotImpl),
        }
    }

    fn draw_frame(&mut self, _planes: &[&[u8]]) -> VoResult<()> {
        Err(VoError::Unsupported {
            driver: INFO.short_name,
            operation: "draw_frame",
        })
    }

    fn draw_slice(&mut self, planes: &[&[u8]], strides: &[usize], w: u32, h: u32, x: u32, y: u32) -> VoResult<()> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(VoError::NotConfigured);
        };
        frame
            .copy_slice(planes, strides, w, h, x, y)
            .map_err(|e| VoError::InvalidFrame(e.to_string()))
    }

    fn flip_page(&mut self) -> VoResult<()> {
        self.write_frame()
    }
}
