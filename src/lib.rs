// SPDX-License-Identifier: GPL-3.0-only

//! vidout - video output drivers and codec configuration for media players
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: The video output driver contract, registry, manager and drivers
//! - [`codecs`]: The codecs.conf parser and codec lookup
//! - [`media`]: Image formats, FourCCs, GUIDs and decoded images
//! - [`pipelines`]: Frame sources and the render loop
//! - [`config`]: User configuration handling
//! - [`storage`]: Output directories and per-frame file names
//!
//! # Example
//!
//! ```no_run
//! use vidout::backends::VideoOutManager;
//! use vidout::pipelines::{RenderOptions, TestPattern, render};
//!
//! let mut vo = VideoOutManager::new();
//! vo.init_best("pnm:pgm:outdir=frames,null").unwrap();
//! let mut source = TestPattern::new(320, 240).with_limit(10);
//! render::run(&mut vo, &mut source, &RenderOptions::default()).unwrap();
//! ```

pub mod backends;
pub mod codecs;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use backends::video_out::{VideoOutManager, VideoOutput, VoError, VoResult};
pub use codecs::{CodecEntry, CodecKind, CodecTable};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use media::{FourCc, Guid, ImgFmt, MpImage};
