// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for video output
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          Render loop / media player         │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │               Backend Layer                 │
//! │  ┌──────────────┐    ┌──────────────────┐   │
//! │  │   Terminal   │    │   File sinks     │   │
//! │  │    (tct)     │    │ pnm/png/jpeg/... │   │
//! │  └──────────────┘    └──────────────────┘   │
//! │                      ┌──────────────────┐   │
//! │                      │   null / md5sum  │   │
//! │                      └──────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod video_out;

pub use video_out::{VideoOutManager, VideoOutput, VoError, VoResult};
