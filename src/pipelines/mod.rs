// SPDX-License-Identifier: GPL-3.0-only

//! Render pipeline driving the video outputs
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Frame source │ ──▶ │    Render loop    │ ──▶ │  VO driver   │
//! │ test pattern │     │  - QueryFormat    │     │ tct, pnm,    │
//! │ raw file     │     │  - draw / slices  │     │ png, ...     │
//! │              │     │  - osd, flip      │     │              │
//! │              │     │  - events, pacing │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`source`]: Frame sources (test pattern, raw frame files)
//! - [`render`]: The synchronous render loop

pub mod render;
pub mod source;

pub use render::{RenderOptions, RenderStats};
pub use source::{FrameSource, RawFileSource, TestPattern};
