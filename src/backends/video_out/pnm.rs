// SPDX-License-Identifier: GPL-3.0-only

//! PPM/PGM/PGMYUV file output
//!
//! Writes one numbered file per frame. PPM takes packed RGB24; PGM writes
//! the luma plane of planar 4:2:0 YUV and PGMYUV appends the chroma planes
//! below it (each chroma row as a U half-row followed by a V half-row),
//! giving an image `h * 3 / 2` rows tall.

use super::subopt::{IntCheck, OptSpec, SubOptions};
use super::types::*;
use super::{VideoOutput, check_geometry};
use crate::constants::image_sink::{DEFAULT_MAX_FILES, DEFAULT_OUTDIR};
use crate::media::{ImageFlags, ImgFmt, MpImage};
use crate::storage::{FrameFileNamer, ensure_output_dir};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

pub static INFO: VoInfo = VoInfo {
    name: "PPM/PGM/PGMYUV file",
    short_name: "pnm",
    author: "vidout",
    comment: "One file per frame, raw or ASCII",
    autoprobe: false,
};

const SUBOPTS: &[OptSpec] = &[
    OptSpec::flag("ppm"),
    OptSpec::flag("pgm"),
    OptSpec::flag("pgmyuv"),
    OptSpec::flag("raw"),
    OptSpec::flag("ascii"),
    OptSpec::string("outdir"),
    OptSpec::string("subdirs"),
    OptSpec::int("maxfiles", Some(IntCheck::Positive)),
];

/// Values per line in ASCII mode
const ASCII_VALUES_PER_LINE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PnmType {
    #[default]
    Ppm,
    Pgm,
    PgmYuv,
}

impl PnmType {
    pub fn extension(self) -> &'static str {
        match self {
            PnmType::Ppm => "ppm",
            PnmType::Pgm => "pgm",
            PnmType::PgmYuv => "pgmyuv",
        }
    }

    fn accepts(self, format: ImgFmt) -> bool {
        match self {
            PnmType::Ppm => format == ImgFmt::RGB24,
            PnmType::Pgm | PnmType::PgmYuv => format.is_yuv420p(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PnmMode {
    #[default]
    Raw,
    Ascii,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    kind: PnmType,
    mode: PnmMode,
    outdir: PathBuf,
    subdirs: Option<String>,
    max_files: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kind: PnmType::default(),
            mode: PnmMode::default(),
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            subdirs: None,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

#[derive(Debug, Default)]
pub struct PnmOutput {
    settings: Settings,
    config: Option<VoConfig>,
    namer: Option<FrameFileNamer>,
}

impl PnmOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> PnmType {
        self.settings.kind
    }

    pub fn mode(&self) -> PnmMode {
        self.settings.mode
    }

    fn write_image(&mut self, image: &MpImage) -> VoResult<()> {
        check_geometry(self.config.as_ref(), image)?;
        if !self.settings.kind.accepts(image.format) {
            return Err(VoError::FormatNotSupported(image.format));
        }
        let Some(namer) = self.namer.as_mut() else {
            return Err(VoError::NotConfigured);
        };
        let path = namer.next_path().map_err(|e| VoError::file(namer.outdir(), e))?;
        let file = File::create(&path).map_err(|e| VoError::file(&path, e))?;
        let mut out = BufWriter::new(file);
        write_pnm(&mut out, image, self.settings.kind, self.settings.mode)
            .and_then(|()| out.flush())
            .map_err(|e| VoError::file(&path, e))?;
        debug!(path = %path.display(), "Frame written");
        Ok(())
    }
}

impl VideoOutput for PnmOutput {
    fn info(&self) -> &'static VoInfo {
        &INFO
    }

    fn preinit(&mut self, subopts: &str) -> VoResult<()> {
        let opts = SubOptions::parse(subopts, SUBOPTS).map_err(|source| VoError::SubOption {
            driver: INFO.short_name,
            source,
        })?;

        let mut settings = Settings::default();
        if opts.is_set("pgmyuv") {
            settings.kind = PnmType::PgmYuv;
        }
        if opts.is_set("pgm") {
            settings.kind = PnmType::Pgm;
        }
        if opts.is_set("ppm") {
            settings.kind = PnmType::Ppm;
        }
        if opts.is_set("ascii") {
            settings.mode = PnmMode::Ascii;
        }
        if opts.is_set("raw") {
            settings.mode = PnmMode::Raw;
        }
        if let Some(dir) = opts.string("outdir") {
            settings.outdir = PathBuf::from(dir);
        }
        settings.subdirs = opts.string("subdirs").map(str::to_string);
        if let Some(max) = opts.int("maxfiles") {
            settings.max_files = u32::try_from(max).unwrap_or(u32::MAX);
        }

        info!(kind = ?settings.kind, mode = ?settings.mode, outdir = %settings.outdir.display(), "pnm suboptions parsed");
        self.settings = settings;
        Ok(())
    }

    fn config(&mut self, cfg: &VoConfig) -> VoResult<()> {
        if self.namer.is_some() {
            self.config = Some(cfg.clone());
            return Ok(());
        }
        let outdir = &self.settings.outdir;
        ensure_output_dir(outdir).map_err(|e| VoError::file(outdir, e))?;
        self.namer = Some(FrameFileNamer::new(
            outdir.clone(),
            self.settings.subdirs.clone(),
            self.settings.max_files,
            self.settings.kind.extension(),
        ));
        self.config = Some(cfg.clone());
        Ok(())
    }

    fn uninit(&mut self) {
        self.namer = None;
        self.config = None;
    }

    fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
        match req {
            Control::QueryFormat(format) => {
                let caps = if self.settings.kind.accepts(format) {
                    VfCaps::CSP_SUPPORTED | VfCaps::CSP_SUPPORTED_BY_HW
                } else {
                    VfCaps::empty()
                };
                Ok(ControlReply::Caps(caps))
            }
            Control::DrawImage(image) => {
                let flags = image.flags();
                let writable = if flags.contains(ImageFlags::PLANAR) {
                    flags.contains(ImageFlags::YUV)
                } else {
                    !flags.contains(ImageFlags::YUV)
                };
                if !writable {
                    return Ok(ControlReply::False);
                }
                self.write_image(image)?;
                Ok(ControlReply::True)
            }
            _ => Ok(ControlReply::NotImpl),
        }
    }

    fn draw_frame(&mut self, _planes: &[&[u8]]) -> VoResult<()> {
        debug!("pnm: draw_frame() is called");
        Err(VoError::Unsupported {
            driver: INFO.short_name,
            operation: "draw_frame",
        })
    }

    fn draw_slice(&mut self, _planes: &[&[u8]], _strides: &[usize], _w: u32, _h: u32, _x: u32, _y: u32) -> VoResult<()> {
        Ok(())
    }

    fn flip_page(&mut self) -> VoResult<()> {
        Ok(())
    }
}

/// Serialize `image` as a PNM file
pub fn write_pnm(out: &mut impl Write, image: &MpImage, kind: PnmType, mode: PnmMode) -> std::io::Result<()> {
    let (w, h) = (image.width as usize, image.height as usize);
    let rows = |plane: usize, width: usize, count: usize| -> Vec<&[u8]> {
        let Some(p) = image.planes.get(plane) else {
            return Vec::new();
        };
        (0..count)
            .filter_map(|row| p.data.get(row * p.stride..row * p.stride + width))
            .collect()
    };

    let magic = match (kind, mode) {
        (PnmType::Ppm, PnmMode::Raw) => "P6",
        (PnmType::Ppm, PnmMode::Ascii) => "P3",
        (_, PnmMode::Raw) => "P5",
        (_, PnmMode::Ascii) => "P2",
    };
    let header_height = if kind == PnmType::PgmYuv { h * 3 / 2 } else { h };
    write!(out, "{magic}\n{w} {header_height}\n255\n")?;

    match (kind, mode) {
        (PnmType::Ppm, PnmMode::Raw) => {
            for row in rows(0, w * 3, h) {
                out.write_all(row)?;
            }
        }
        (PnmType::Ppm, PnmMode::Ascii) => {
            let pixels: Vec<u8> = rows(0, w * 3, h).concat();
            write_ascii_run(out, &pixels)?;
        }
        (_, PnmMode::Raw) => {
            for row in rows(0, w, h) {
                out.write_all(row)?;
            }
            if kind == PnmType::PgmYuv {
                for (u, v) in rows(1, w / 2, h / 2).into_iter().zip(rows(2, w / 2, h / 2)) {
                    out.write_all(u)?;
                    out.write_all(v)?;
                }
            }
        }
        (_, PnmMode::Ascii) => {
            for row in rows(0, w, h) {
                write_ascii_run(out, row)?;
            }
            if kind == PnmType::PgmYuv {
                for (u, v) in rows(1, w / 2, h / 2).into_iter().zip(rows(2, w / 2, h / 2)) {
                    write_ascii_run(out, u)?;
                    write_ascii_run(out, v)?;
                }
            }
        }
    }
    Ok(())
}

/// Write `values` as `%03d`, fifteen per line while at least sixteen remain,
/// the remainder space-separated on a final line.
fn write_ascii_run(out: &mut impl Write, values: &[u8]) -> std::io::Result<()> {
    let mut i = 0;
    while i + ASCII_VALUES_PER_LINE < values.len() {
        let line: Vec<String> = values[i..i + ASCII_VALUES_PER_LINE]
            .iter()
            .map(|v| format!("{v:03}"))
            .collect();
        writeln!(out, "{}", line.join(" "))?;
        i += ASCII_VALUES_PER_LINE;
    }
    for v in &values[i..] {
        write!(out, "{v:03} ")?;
    }
    writeln!(out)
}
