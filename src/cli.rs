// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing video output drivers
//! - Listing codecs from codecs.conf
//! - Looking up decoders for a FourCC
//! - Showing and changing the settings file
//! - Playing a test pattern or raw file through a driver

use std::path::{Path, PathBuf};
use tracing::info;
use vidout::backends::video_out::{Framerate, list_drivers};
use vidout::codecs::{CodecKind, CodecTable};
use vidout::constants::render::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use vidout::pipelines::{FrameSource, RawFileSource, RenderOptions, TestPattern, render};
use vidout::errors::ConfigError;
use vidout::{Config, FourCc, ImgFmt, VideoOutManager};

/// Drivers that write files and take an `outdir=` sub-option
const FILE_SINKS: &[&str] = &["pnm", "png", "jpeg"];

/// Print every registered video output driver
pub fn list_video_drivers() -> Result<(), Box<dyn std::error::Error>> {
    println!("Available video output drivers:");
    print!("{}", list_drivers());
    Ok(())
}

fn load_codecs(config: &Config, codecs_conf: Option<PathBuf>) -> Result<CodecTable, Box<dyn std::error::Error>> {
    let path = codecs_conf.or_else(|| config.codecs_conf_path());
    Ok(CodecTable::load(path.as_deref())?)
}

fn kind(audio: bool) -> CodecKind {
    if audio { CodecKind::Audio } else { CodecKind::Video }
}

/// Print the video or audio codec table
pub fn list_codecs(config: &Config, audio: bool, codecs_conf: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_codecs(config, codecs_conf)?;
    print!("{}", table.list(kind(audio)));
    Ok(())
}

/// Print the codecs that would be tried for `code`, in order
pub fn find_codec(
    config: &Config,
    code: &str,
    audio: bool,
    force: bool,
    codecs_conf: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let fourcc: FourCc = code.parse()?;
    let table = load_codecs(config, codecs_conf)?;

    let mut found = false;
    for candidate in table.selector(fourcc, kind(audio), force) {
        found = true;
        let map = candidate.map.map_or_else(|| "-".to_string(), |m| m.to_string());
        println!(
            "{:<11} {:<9} {}  map={}  {}",
            candidate.codec.name,
            candidate.codec.driver,
            candidate.codec.status.label(),
            map,
            candidate.codec.info
        );
    }
    if !found {
        println!("No {} codec for {}", kind(audio), fourcc);
    }
    Ok(())
}

/// Print the settings; with `KEY=VALUE` pairs, apply them and save
pub fn configure(mut config: Config, settings: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if !settings.is_empty() {
        apply_settings(&mut config, settings)?;
        config.save()?;
        info!("Configuration saved");
    }
    match Config::path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no configuration directory"),
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn apply_settings(config: &mut Config, settings: &[String]) -> Result<(), ConfigError> {
    for setting in settings {
        let (key, value) = setting
            .split_once('=')
            .ok_or_else(|| ConfigError::UnknownKey(setting.clone()))?;
        config.set(key.trim(), value)?;
    }
    Ok(())
}

/// Options of the `play` command
#[derive(Debug, Clone)]
pub struct PlayArgs {
    pub vo: Option<String>,
    pub source: String,
    pub format: Option<String>,
    pub size: Option<(u32, u32)>,
    pub frames: Option<u64>,
    pub fps: Option<u32>,
    pub slices: u32,
    pub pace: bool,
}

/// Render a test pattern or raw file through the first usable driver
pub fn play(config: &Config, args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let list = args.vo.clone().unwrap_or_else(|| config.video_out.clone());
    let list = with_output_dir(&list, &config.output_dir);

    let (width, height) = args.size.unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT));
    let fps = Framerate::from_int(args.fps.unwrap_or(config.fps));
    let mut source: Box<dyn FrameSource> = if args.source == "test" {
        Box::new(TestPattern::new(width, height))
    } else {
        let name = args.format.as_deref().unwrap_or("i420");
        let format = ImgFmt::from_name(name).ok_or_else(|| format!("Unknown image format: {name}"))?;
        Box::new(RawFileSource::open(Path::new(&args.source), format, width, height)?.with_fps(fps))
    };

    let mut vo = VideoOutManager::new();
    let driver = vo.init_best(&list)?;
    info!(driver = %driver.short_name, "Playing");

    let opts = RenderOptions {
        max_frames: args.frames,
        slices: args.slices.max(1),
        fps,
        pace: args.pace || driver.short_name == "tct",
        title: args.source.clone(),
    };
    let stats = render::run(&mut vo, source.as_mut(), &opts)?;
    vo.uninit();

    println!(
        "{}: {} frames as {} via {}",
        args.source, stats.frames, stats.format, driver.short_name
    );
    Ok(())
}

/// Give file sinks in `list` the configured output directory unless they name one
fn with_output_dir(list: &str, dir: &Path) -> String {
    let dir = dir.to_string_lossy();
    if dir == "." {
        return list.to_string();
    }
    list.split(',')
        .map(|entry| {
            let (name, subopts) = entry.split_once(':').unwrap_or((entry, ""));
            if !FILE_SINKS.contains(&name) || subopts.contains("outdir=") {
                return entry.to_string();
            }
            // Length-prefixed so the path may contain ':'
            let outdir = format!("outdir=%{}%{}", dir.len(), dir);
            if subopts.is_empty() {
                format!("{name}:{outdir}")
            } else {
                format!("{name}:{subopts}:{outdir}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: u32 = w.parse().map_err(|_| format!("invalid width {w:?}"))?;
    let h: u32 = h.parse().map_err(|_| format!("invalid height {h:?}"))?;
    if w == 0 || h == 0 {
        return Err("size must be non-zero".into());
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("320x240"), Ok((320, 240)));
        assert_eq!(parse_size("64X48"), Ok((64, 48)));
        assert!(parse_size("320").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn test_apply_settings() {
        let mut config = Config::default();
        apply_settings(&mut config, &["fps=50".into(), "video_out=null".into()]).unwrap();
        assert_eq!(config.fps, 50);
        assert_eq!(config.video_out, "null");
        assert!(apply_settings(&mut config, &["fps".into()]).is_err());
    }

    #[test]
    fn test_output_dir_for_file_sinks() {
        let dir = Path::new("/tmp/a:b");
        assert_eq!(
            with_output_dir("pnm:pgm,png,null,", dir),
            "pnm:pgm:outdir=%8%/tmp/a:b,png:outdir=%8%/tmp/a:b,null,"
        );
        assert_eq!(with_output_dir("jpeg:outdir=x", dir), "jpeg:outdir=x");
        assert_eq!(with_output_dir("pnm", Path::new(".")), "pnm");
    }
}
