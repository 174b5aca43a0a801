// SPDX-License-Identifier: GPL-3.0-only

//! Format identifiers and pixel conversions
//!
//! This module provides FourCC codes, image format ids and the software
//! conversions sinks use when they need packed RGB.

pub mod conversions;
pub mod fourcc;
pub mod imgfmt;

pub use fourcc::{FourCc, ParseFourCcError, parse_c_ulong};
pub use imgfmt::ImgFmt;
