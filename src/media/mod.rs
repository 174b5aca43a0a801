// SPDX-License-Identifier: GPL-3.0-only

//! Media types shared by the codec table and the video outputs
//!
//! # Modules
//!
//! - [`formats`]: FourCC codes, image format ids and RGB conversion
//! - [`guid`]: DirectShow-style GUIDs and the FourCC mapping
//! - [`image`]: Owned planar/packed images passed to drivers

pub mod formats;
pub mod guid;
pub mod image;

pub use formats::{FourCc, ImgFmt};
pub use guid::Guid;
pub use image::{ImageFlags, MpImage, Plane, SliceError};
