// SPDX-License-Identifier: GPL-3.0-only

//! Raster image format identifiers
//!
//! Image formats are plain 32-bit ids: YUV formats reuse their FourCC, packed
//! RGB/BGR formats carry `'R' 'G' 'B'` (or `'B' 'G' 'R'`) in the top three
//! bytes and the bit depth in the low byte.

use super::FourCc;
use std::fmt;

/// An image format id (`IMGFMT_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImgFmt(pub u32);

const RGB_MASK: u32 = 0xFFFF_FF00;
const RGB_BASE: u32 = (b'R' as u32) << 24 | (b'G' as u32) << 16 | (b'B' as u32) << 8;
const BGR_BASE: u32 = (b'B' as u32) << 24 | (b'G' as u32) << 16 | (b'R' as u32) << 8;
const HWACCEL_MASK: u32 = 0xFFFF_0000;
const VDPAU_BASE: u32 = 0x1DC8_0000;
const XVMC_BASE: u32 = 0x1DC7_0000;

const fn fourcc(code: &[u8; 4]) -> ImgFmt {
    ImgFmt(FourCc::from_bytes(*code).0)
}

impl ImgFmt {
    // ===== Packed RGB / BGR =====
    pub const RGB1: Self = Self(RGB_BASE | 1);
    pub const RGB4: Self = Self(RGB_BASE | 4);
    pub const RGB8: Self = Self(RGB_BASE | 8);
    pub const RGB12: Self = Self(RGB_BASE | 12);
    pub const RGB15: Self = Self(RGB_BASE | 15);
    pub const RGB16: Self = Self(RGB_BASE | 16);
    pub const RGB24: Self = Self(RGB_BASE | 24);
    pub const RGB32: Self = Self(RGB_BASE | 32);
    pub const BGR1: Self = Self(BGR_BASE | 1);
    pub const BGR4: Self = Self(BGR_BASE | 4);
    pub const BGR8: Self = Self(BGR_BASE | 8);
    pub const BGR12: Self = Self(BGR_BASE | 12);
    pub const BGR15: Self = Self(BGR_BASE | 15);
    pub const BGR16: Self = Self(BGR_BASE | 16);
    pub const BGR24: Self = Self(BGR_BASE | 24);
    pub const BGR32: Self = Self(BGR_BASE | 32);

    // ===== Planar YUV =====
    pub const YV12: Self = fourcc(b"YV12");
    pub const I420: Self = fourcc(b"I420");
    pub const IYUV: Self = fourcc(b"IYUV");
    pub const YVU9: Self = fourcc(b"YVU9");
    pub const IF09: Self = fourcc(b"IF09");
    pub const Y800: Self = fourcc(b"Y800");
    pub const Y8: Self = fourcc(b"Y8  ");
    pub const P444: Self = fourcc(b"444P");
    pub const P422: Self = fourcc(b"422P");
    pub const P411: Self = fourcc(b"411P");
    pub const P440: Self = fourcc(b"440P");
    pub const NV12: Self = fourcc(b"NV12");
    pub const NV21: Self = fourcc(b"NV21");
    pub const HM12: Self = fourcc(b"HM12");

    // ===== Packed YUV =====
    pub const YUY2: Self = fourcc(b"YUY2");
    pub const UYVY: Self = fourcc(b"UYVY");
    pub const YVYU: Self = fourcc(b"YVYU");

    // ===== Compressed / hardware surfaces =====
    pub const MPES: Self = Self((b'M' as u32) << 24 | (b'P' as u32) << 16 | (b'E' as u32) << 8 | b'S' as u32);
    pub const XVMC_MOCO_MPEG2: Self = Self(XVMC_BASE | 0x02);
    pub const XVMC_IDCT_MPEG2: Self = Self(XVMC_BASE | 0x82);
    pub const VDPAU_MPEG1: Self = Self(VDPAU_BASE | 0x01);
    pub const VDPAU_MPEG2: Self = Self(VDPAU_BASE | 0x02);
    pub const VDPAU_H264: Self = Self(VDPAU_BASE | 0x03);
    pub const VDPAU_WMV3: Self = Self(VDPAU_BASE | 0x04);
    pub const VDPAU_VC1: Self = Self(VDPAU_BASE | 0x05);
    pub const VDPAU_MPEG4: Self = Self(VDPAU_BASE | 0x06);

    /// Every format with a name, in lookup order
    const NAMED: &'static [(&'static str, ImgFmt)] = &[
        ("rgb1", Self::RGB1),
        ("rgb4", Self::RGB4),
        ("rgb8", Self::RGB8),
        ("rgb12", Self::RGB12),
        ("rgb15", Self::RGB15),
        ("rgb16", Self::RGB16),
        ("rgb24", Self::RGB24),
        ("rgb32", Self::RGB32),
        ("bgr1", Self::BGR1),
        ("bgr4", Self::BGR4),
        ("bgr8", Self::BGR8),
        ("bgr12", Self::BGR12),
        ("bgr15", Self::BGR15),
        ("bgr16", Self::BGR16),
        ("bgr24", Self::BGR24),
        ("bgr32", Self::BGR32),
        ("yv12", Self::YV12),
        ("i420", Self::I420),
        ("iyuv", Self::IYUV),
        ("yvu9", Self::YVU9),
        ("if09", Self::IF09),
        ("y800", Self::Y800),
        ("y8", Self::Y8),
        ("444p", Self::P444),
        ("422p", Self::P422),
        ("411p", Self::P411),
        ("440p", Self::P440),
        ("nv12", Self::NV12),
        ("nv21", Self::NV21),
        ("hm12", Self::HM12),
        ("yuy2", Self::YUY2),
        ("uyvy", Self::UYVY),
        ("yvyu", Self::YVYU),
        ("mpes", Self::MPES),
        ("xvmc_moco_mpeg2", Self::XVMC_MOCO_MPEG2),
        ("xvmc_idct_mpeg2", Self::XVMC_IDCT_MPEG2),
        ("vdpau_mpeg1", Self::VDPAU_MPEG1),
        ("vdpau_mpeg2", Self::VDPAU_MPEG2),
        ("vdpau_h264", Self::VDPAU_H264),
        ("vdpau_wmv3", Self::VDPAU_WMV3),
        ("vdpau_vc1", Self::VDPAU_VC1),
        ("vdpau_mpeg4", Self::VDPAU_MPEG4),
    ];

    /// Look a format up by name, ignoring case (`YV12`, `bgr32`, `VDPAU_H264`)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, fmt)| *fmt)
    }

    /// Canonical (lowercase) name, if the format is known
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, fmt)| *fmt == self)
            .map(|(n, _)| *n)
    }

    /// Every named format
    pub fn all() -> impl Iterator<Item = ImgFmt> {
        Self::NAMED.iter().map(|(_, fmt)| *fmt)
    }

    pub const fn is_rgb(self) -> bool {
        self.0 & RGB_MASK == RGB_BASE
    }

    pub const fn is_bgr(self) -> bool {
        self.0 & RGB_MASK == BGR_BASE
    }

    /// Hardware decoder surfaces that carry no pixels a software sink can read
    pub const fn is_hwaccel(self) -> bool {
        let family = self.0 & HWACCEL_MASK;
        family == VDPAU_BASE || family == XVMC_BASE
    }

    pub fn is_yuv(self) -> bool {
        !self.is_rgb() && !self.is_bgr() && !self.is_hwaccel() && self != Self::MPES
    }

    /// Bit depth of an RGB/BGR format
    pub const fn rgb_depth(self) -> Option<u32> {
        if self.is_rgb() || self.is_bgr() {
            Some(self.0 & 0x7F)
        } else {
            None
        }
    }

    /// Chroma subsampling as (horizontal, vertical) shifts for planar YUV
    pub fn chroma_shift(self) -> Option<(u32, u32)> {
        match self {
            f if f == Self::YV12 || f == Self::I420 || f == Self::IYUV => Some((1, 1)),
            f if f == Self::NV12 || f == Self::NV21 || f == Self::HM12 => Some((1, 1)),
            f if f == Self::YVU9 || f == Self::IF09 => Some((2, 2)),
            f if f == Self::P444 => Some((0, 0)),
            f if f == Self::P422 => Some((1, 0)),
            f if f == Self::P411 => Some((2, 0)),
            f if f == Self::P440 => Some((0, 1)),
            _ => None,
        }
    }

    pub fn is_planar(self) -> bool {
        self.chroma_shift().is_some() || self == Self::Y800 || self == Self::Y8
    }

    /// Planar YUV with three separate 4:2:0 planes
    pub fn is_yuv420p(self) -> bool {
        self == Self::YV12 || self == Self::I420 || self == Self::IYUV
    }

    /// Stored as Y, V, U: the chroma planes come in reverse order in memory
    pub fn is_vu_order(self) -> bool {
        self == Self::YV12 || self == Self::YVU9
    }

    /// Number of planes an image of this format is made of
    pub fn num_planes(self) -> usize {
        if self == Self::Y800 || self == Self::Y8 {
            1
        } else if self == Self::NV12 || self == Self::NV21 || self == Self::HM12 {
            2
        } else if self.is_planar() {
            3
        } else {
            1
        }
    }

    /// Average bits per pixel
    pub fn bits_per_pixel(self) -> Option<u32> {
        if let Some(depth) = self.rgb_depth() {
            return Some(depth);
        }
        if self == Self::Y800 || self == Self::Y8 {
            return Some(8);
        }
        if let Some((xs, ys)) = self.chroma_shift() {
            let chroma = 2 * 8 / (1 << (xs + ys));
            return Some(8 + chroma);
        }
        if self == Self::YUY2 || self == Self::UYVY || self == Self::YVYU {
            return Some(16);
        }
        None
    }

    /// Width and height of plane `plane` for an image of `width` x `height`
    pub fn plane_size(self, plane: usize, width: u32, height: u32) -> (u32, u32) {
        if plane == 0 {
            return (width, height);
        }
        match self.chroma_shift() {
            Some((_, ys)) if self.num_planes() == 2 => (width, height.div_ceil(1 << ys)),
            Some((xs, ys)) => (width.div_ceil(1 << xs), height.div_ceil(1 << ys)),
            None => (0, 0),
        }
    }

    /// Bytes of visible data in one row of plane `plane`
    pub fn plane_row_bytes(self, plane: usize, width: u32) -> usize {
        let (w, _) = self.plane_size(plane, width, 1);
        if self.is_planar() {
            return w as usize;
        }
        match self.bits_per_pixel() {
            Some(bpp) => (w as usize * bpp as usize).div_ceil(8),
            None => 0,
        }
    }
}

impl From<FourCc> for ImgFmt {
    fn from(code: FourCc) -> Self {
        Self(code.0)
    }
}

impl fmt::Display for ImgFmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name.to_ascii_uppercase()),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}
