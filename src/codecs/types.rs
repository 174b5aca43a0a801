// SPDX-License-Identifier: GPL-3.0-only

//! Codec descriptor types

use crate::media::{FourCc, Guid, ImgFmt};
use std::fmt;

/// Which partition of the table a codec lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodecKind {
    #[default]
    Video,
    Audio,
}

impl CodecKind {
    /// Block keyword introducing a codec of this kind
    pub fn keyword(self) -> &'static str {
        match self {
            CodecKind::Video => "videocodec",
            CodecKind::Audio => "audiocodec",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "videocodec" => Some(CodecKind::Video),
            "audiocodec" => Some(CodecKind::Audio),
            _ => None,
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::Video => write!(f, "video"),
            CodecKind::Audio => write!(f, "audio"),
        }
    }
}

/// How well a codec is known to work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodecStatus {
    /// `crashing`
    NotWorking,
    /// `buggy`; also what a codec without a `status` line gets
    #[default]
    Problems,
    /// `working`
    Working,
    /// `untested`
    Untested,
}

impl CodecStatus {
    /// Parse a `status` argument, ignoring case
    pub fn from_keyword(word: &str) -> Option<Self> {
        [
            ("working", CodecStatus::Working),
            ("crashing", CodecStatus::NotWorking),
            ("untested", CodecStatus::Untested),
            ("buggy", CodecStatus::Problems),
        ]
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(word))
        .map(|(_, status)| status)
    }

    /// Fixed-width word used by the codec listing
    pub fn label(self) -> &'static str {
        match self {
            CodecStatus::Working => "working ",
            CodecStatus::Problems => "problems",
            CodecStatus::NotWorking => "crashing",
            CodecStatus::Untested => "untested",
        }
    }
}

bitflags::bitflags! {
    /// Per-codec flags set by `flags` lines
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CodecFlags: u32 {
        const SEEKABLE = 1 << 0;
        const ALIGN16 = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Flags attached to each `out`/`in` image format
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OutFlags: u8 {
        const FLIP = 1 << 0;
        const NOFLIP = 1 << 1;
        const YUVHACK = 1 << 2;
        const QUERY = 1 << 3;
        const STATIC = 1 << 4;
    }
}

impl OutFlags {
    /// Keywords in bit order
    pub const KEYWORDS: [(&'static str, OutFlags); 5] = [
        ("flip", OutFlags::FLIP),
        ("noflip", OutFlags::NOFLIP),
        ("yuvhack", OutFlags::YUVHACK),
        ("query", OutFlags::QUERY),
        ("static", OutFlags::STATIC),
    ];
}

/// A FourCC/format id a codec accepts and the id it is handed to the driver as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourccMapping {
    pub fourcc: FourCc,
    pub map: FourCc,
}

/// An image format a codec produces or consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatSlot {
    pub format: ImgFmt,
    pub flags: OutFlags,
}

/// One `videocodec`/`audiocodec` block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodecEntry {
    pub name: String,
    pub info: String,
    pub comment: Option<String>,
    pub fourcc: Vec<FourccMapping>,
    pub outfmt: Vec<FormatSlot>,
    pub infmt: Vec<FormatSlot>,
    pub driver: String,
    pub dll: Option<String>,
    pub guid: Option<Guid>,
    pub flags: CodecFlags,
    pub status: CodecStatus,
    pub anyinput: bool,
    pub kind: CodecKind,
}

impl CodecEntry {
    /// The mapped code for `fourcc`, if this codec lists it
    pub fn map_fourcc(&self, fourcc: FourCc) -> Option<FourCc> {
        self.fourcc.iter().find(|m| m.fourcc == fourcc).map(|m| m.map)
    }

    pub fn outputs(&self) -> impl Iterator<Item = ImgFmt> + '_ {
        self.outfmt.iter().map(|slot| slot.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_keywords_ignore_case() {
        assert_eq!(CodecStatus::from_keyword("Working"), Some(CodecStatus::Working));
        assert_eq!(CodecStatus::from_keyword("CRASHING"), Some(CodecStatus::NotWorking));
        assert_eq!(CodecStatus::from_keyword("buggy"), Some(CodecStatus::Problems));
        assert_eq!(CodecStatus::from_keyword("fine"), None);
        assert_eq!(CodecStatus::default(), CodecStatus::Problems);
    }

    #[test]
    fn test_out_flag_bits_follow_keyword_order() {
        for (bit, (_, flag)) in OutFlags::KEYWORDS.iter().enumerate() {
            assert_eq!(flag.bits(), 1 << bit);
        }
    }

    #[test]
    fn test_map_fourcc() {
        let entry = CodecEntry {
            fourcc: vec![FourccMapping {
                fourcc: FourCc::from_bytes(*b"DIV3"),
                map: FourCc::from_bytes(*b"DIVX"),
            }],
            ..Default::default()
        };
        assert_eq!(entry.map_fourcc(FourCc::from_bytes(*b"DIV3")), Some(FourCc::from_bytes(*b"DIVX")));
        assert_eq!(entry.map_fourcc(FourCc::from_bytes(*b"XVID")), None);
    }
}
