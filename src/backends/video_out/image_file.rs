// SPDX-License-Identifier: GPL-3.0-only

//! PNG and JPEG file output
//!
//! One numbered image file per frame, encoded with the `image` crate.
//! Both drivers take packed RGB; PNG with `alpha` also takes 32-bit RGBA.

use super::subopt::{IntCheck, OptSpec, SubOptions};
use super::types::*;
use super::{VideoOutput, check_geometry};
use crate::constants::image_sink::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_FILES, DEFAULT_OUTDIR, DEFAULT_PNG_COMPRESSION};
use crate::media::{ImgFmt, MpImage};
use crate::storage::{FrameFileNamer, ensure_output_dir};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub static PNG_INFO: VoInfo = VoInfo {
    name: "PNG file",
    short_name: "png",
    author: "vidout",
    comment: "One PNG per frame",
    autoprobe: false,
};

pub static JPEG_INFO: VoInfo = VoInfo {
    name: "JPEG file",
    short_name: "jpeg",
    author: "vidout",
    comment: "One JPEG per frame",
    autoprobe: false,
};

const PNG_SUBOPTS: &[OptSpec] = &[
    OptSpec::int("z", Some(IntCheck::Range(0, 9))),
    OptSpec::flag("alpha"),
    OptSpec::string("outdir"),
    OptSpec::string("subdirs"),
    OptSpec::int("maxfiles", Some(IntCheck::Positive)),
];

const JPEG_SUBOPTS: &[OptSpec] = &[
    OptSpec::int("quality", Some(IntCheck::Range(0, 100))),
    OptSpec::string("outdir"),
    OptSpec::string("subdirs"),
    OptSpec::int("maxfiles", Some(IntCheck::Positive)),
];

/// Encoder and its settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png { compression: u8, alpha: bool },
    Jpeg { quality: u8 },
}

impl ImageKind {
    fn info(self) -> &'static VoInfo {
        match self {
            ImageKind::Png { .. } => &PNG_INFO,
            ImageKind::Jpeg { .. } => &JPEG_INFO,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ImageKind::Png { .. } => "png",
            ImageKind::Jpeg { .. } => "jpg",
        }
    }

    fn accepts(self, format: ImgFmt) -> bool {
        let rgb = format == ImgFmt::RGB24 || format == ImgFmt::BGR24;
        match self {
            ImageKind::Png { alpha: true, .. } => rgb || format == ImgFmt::RGB32 || format == ImgFmt::BGR32,
            _ => rgb,
        }
    }

    /// zlib level mapped onto the encoder's presets
    fn png_compression(level: u8) -> CompressionType {
        match level {
            0..=2 => CompressionType::Fast,
            3..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }
}

#[derive(Debug)]
pub struct ImageFileOutput {
    kind: ImageKind,
    outdir: PathBuf,
    subdirs: Option<String>,
    max_files: u32,
    config: Option<VoConfig>,
    namer: Option<FrameFileNamer>,
}

impl ImageFileOutput {
    pub fn png() -> Self {
        Self::with_kind(ImageKind::Png {
            compression: DEFAULT_PNG_COMPRESSION,
            alpha: false,
        })
    }

    pub fn jpeg() -> Self {
        Self::with_kind(ImageKind::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        })
    }

    fn with_kind(kind: ImageKind) -> Self {
        Self {
            kind,
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            subdirs: None,
            max_files: DEFAULT_MAX_FILES,
            config: None,
            namer: None,
        }
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    fn write_image(&mut self, image: &MpImage) -> VoResult<()> {
        check_geometry(self.config.as_ref(), image)?;
        let (pixels, color) = packed_pixels(image).ok_or(VoError::FormatNotSupported(image.format))?;
        let Some(namer) = self.namer.as_mut() else {
            return Err(VoError::NotConfigured);
        };
        let path = namer.next_path().map_err(|e| VoError::file(namer.outdir(), e))?;
        encode_to_file(&path, self.kind, &pixels, image.width, image.height, color)?;
        debug!(path = %path.display(), "Frame written");
        Ok(())
    }
}

/// Visible pixels as tightly packed RGB8 or RGBA8
fn packed_pixels(image: &MpImage) -> Option<(Vec<u8>, ExtendedColorType)> {
    let (bpp, color) = match image.format {
        ImgFmt::RGB24 | ImgFmt::BGR24 => (3, ExtendedColorType::Rgb8),
        ImgFmt::RGB32 | ImgFmt::BGR32 => (4, ExtendedColorType::Rgba8),
        _ => return None,
    };
    let mut pixels: Vec<u8> = image.rows(0).flatten().copied().collect();
    if image.format.is_bgr() {
        for px in pixels.chunks_exact_mut(bpp) {
            px.swap(0, 2);
        }
    }
    Some((pixels, color))
}

fn encode_to_file(path: &Path, kind: ImageKind, pixels: &[u8], width: u32, height: u32, color: ExtendedColorType) -> VoResult<()> {
    let file = File::create(path).map_err(|e| VoError::file(path, e))?;
    let mut out = BufWriter::new(file);
    match kind {
        ImageKind::Png { compression, .. } => {
            let encoder = PngEncoder::new_with_quality(&mut out, ImageKind::png_compression(compression), FilterType::Adaptive);
            encoder.write_image(pixels, width, height, color)?;
        }
        ImageKind::Jpeg { quality } => {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
            encoder.encode(pixels, width, height, color)?;
        }
    }
    out.flush().map_err(|e| VoError::file(path, e))
}

impl VideoOutput for ImageFileOutput {
    fn info(&self) -> &'static VoInfo {
        self.kind.info()
    }

    fn preinit(&mut self, subopts: &str) -> VoResult<()> {
        let specs = match self.kind {
            ImageKind::Png { .. } => PNG_SUBOPTS,
            ImageKind::Jpeg { .. } => JPEG_SUBOPTS,
        };
        let opts = SubOptions::parse(subopts, specs).map_err(|source| VoError::SubOption {
            driver: self.kind.info().short_name,
            source,
        })?;

        self.kind = match self.kind {
            ImageKind::Png { .. } => ImageKind::Png {
                compression: opts.int("z").map_or(DEFAULT_PNG_COMPRESSION, |z| z as u8),
                alpha: opts.is_set("alpha"),
            },
            ImageKind::Jpeg { .. } => ImageKind::Jpeg {
                quality: opts.int("quality").map_or(DEFAULT_JPEG_QUALITY, |q| q as u8),
            },
        };
        self.outdir = PathBuf::from(opts.string("outdir").unwrap_or(DEFAULT_OUTDIR));
        self.subdirs = opts.string("subdirs").map(str::to_string);
        self.max_files = opts
            .int("maxfiles")
            .map_or(DEFAULT_MAX_FILES, |m| u32::try_from(m).unwrap_or(u32::MAX));

        info!(kind = ?self.kind, outdir = %self.outdir.display(), "Image file output ready");
        Ok(())
    }

    fn config(&mut self, cfg: &VoConfig) -> VoResult<()> {
        if self.namer.is_none() {
            ensure_output_dir(&self.outdir).map_err(|e| VoError::file(&self.outdir, e))?;
            self.namer = Some(FrameFileNamer::new(
                self.outdir.clone(),
                self.subdirs.clone(),
                self.max_files,
                self.kind.extension(),
            ));
        }
        self.config = Some(cfg.clone());
        Ok(())
    }

    fn uninit(&mut self) {
        if let Some(namer) = self.namer.take() {
            debug!(frames = namer.frame_count(), "Image file output closed");
        }
        self.config = None;
    }

    fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
        match req {
            Control::QueryFormat(format) if self.kind.accepts(format) => {
                Ok(ControlReply::Caps(VfCaps::CSP_SUPPORTED | VfCaps::CSP_SUPPORTED_BY_HW))
            }
            Control::QueryFormat(_) => Ok(ControlReply::Caps(VfCaps::empty())),
            Control::DrawImage(image) if self.kind.accepts(image.format) => {
                self.write_image(image)?;
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
        if !self.kind.accepts(cfg.format) {
            return Err(VoError::FormatNotSupported(cfg.format));
        }
        let owned = planes.iter().map(|p| p.to_vec()).collect();
        let image = MpImage::from_packed_planes(cfg.format, cfg.width, cfg.height, owned)
            .ok_or_else(|| VoError::InvalidFrame("frame does not match the configured format".into()))?;
        self.write_image(&image)
    }

    fn draw_slice(&mut self, _planes: &[&[u8]], _strides: &[usize], _w: u32, _h: u32, _x: u32, _y: u32) -> VoResult<()> {
        Ok(())
    }

    fn flip_page(&mut self) -> VoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suboptions_per_kind() {
        let mut png = ImageFileOutput::png();
        png.preinit("z=9:alpha").unwrap();
        assert_eq!(png.kind(), ImageKind::Png { compression: 9, alpha: true });
        assert!(png.preinit("z=10").is_err());
        assert!(png.preinit("quality=50").is_err());

        let mut jpeg = ImageFileOutput::jpeg();
        jpeg.preinit("quality=90").unwrap();
        assert_eq!(jpeg.kind(), ImageKind::Jpeg { quality: 90 });
        assert!(jpeg.preinit("alpha").is_err());
    }

    #[test]
    fn test_alpha_widens_formats() {
        let mut png = ImageFileOutput::png();
        png.preinit("").unwrap();
        assert!(png.control(Control::QueryFormat(ImgFmt::RGB32)).unwrap().caps().is_empty());
        png.preinit("alpha").unwrap();
        assert!(!png.control(Control::QueryFormat(ImgFmt::RGB32)).unwrap().caps().is_empty());
        assert!(png.control(Control::QueryFormat(ImgFmt::YV12)).unwrap().caps().is_empty());
    }

    #[test]
    fn test_bgr_is_swapped() {
        let mut image = MpImage::new(ImgFmt::BGR24, 1, 1);
        image.planes[0].data[..3].copy_from_slice(&[1, 2, 3]);
        let (pixels, color) = packed_pixels(&image).unwrap();
        assert_eq!(pixels, vec![3, 2, 1]);
        assert_eq!(color, ExtendedColorType::Rgb8);
    }

    #[test]
    fn test_png_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut vo = ImageFileOutput::png();
        vo.preinit(&format!("outdir={}", tmp.path().display())).unwrap();
        vo.config(&VoConfig::new(ImgFmt::RGB24, 2, 1)).unwrap();
        let mut image = MpImage::new(ImgFmt::RGB24, 2, 1);
        image.planes[0].data[..6].copy_from_slice(&[255, 0, 0, 0, 0, 255]);
        assert_eq!(vo.control(Control::DrawImage(&image)).unwrap(), ControlReply::True);

        let decoded = image::open(tmp.path().join("00000001.png")).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(decoded.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_jpeg_writes_jpg_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut vo = ImageFileOutput::jpeg();
        vo.preinit(&format!("outdir={}:subdirs=part:maxfiles=1", tmp.path().display())).unwrap();
        vo.config(&VoConfig::new(ImgFmt::RGB24, 8, 8)).unwrap();
        let image = MpImage::new(ImgFmt::RGB24, 8, 8);
        vo.control(Control::DrawImage(&image)).unwrap();
        vo.control(Control::DrawImage(&image)).unwrap();
        assert!(tmp.path().join("part00000001").join("00000001.jpg").is_file());
        assert!(tmp.path().join("part00000002").join("00000002.jpg").is_file());
    }
}
