// SPDX-License-Identifier: GPL-3.0-only

//! DirectShow-style GUIDs
//!
//! Codec entries may carry the GUID of the DirectShow filter that decodes
//! them. Media subtypes for FourCC video formats and WAVE format tags all
//! share the FOURCCMap base `{XXXXXXXX-0000-0010-8000-00AA00389B71}`, with the
//! code in the first field.

use super::formats::FourCc;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tail shared by every FOURCCMap GUID
const FOURCC_MAP_TAIL: (u16, u16, [u8; 8]) = (0x0000, 0x0010, [0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71]);

/// A Windows GUID, stored with the field layout of `GUID { Data1..Data4 }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid(pub Uuid);

impl Guid {
    /// All-zero GUID (`GUID_NULL`)
    pub const NULL: Self = Self(Uuid::nil());

    pub fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self(Uuid::from_fields(data1, data2, data3, &data4))
    }

    /// `(Data1, Data2, Data3, Data4)`
    pub fn fields(&self) -> (u32, u16, u16, [u8; 8]) {
        let (d1, d2, d3, d4) = self.0.as_fields();
        (d1, d2, d3, *d4)
    }

    /// Media subtype GUID for a FourCC
    pub fn from_fourcc(fourcc: FourCc) -> Self {
        let (d2, d3, d4) = FOURCC_MAP_TAIL;
        Self::from_fields(fourcc.0, d2, d3, d4)
    }

    /// Media subtype GUID for a WAVE format tag (`WAVE_FORMAT_PCM` is 1)
    pub fn from_wave_format_tag(tag: u16) -> Self {
        let (d2, d3, d4) = FOURCC_MAP_TAIL;
        Self::from_fields(u32::from(tag), d2, d3, d4)
    }

    /// The FourCC this GUID maps, if it is a FOURCCMap GUID
    pub fn fourcc(&self) -> Option<FourCc> {
        let (d1, d2, d3, d4) = self.fields();
        ((d2, d3, d4) == FOURCC_MAP_TAIL).then_some(FourCc(d1))
    }

    /// The WAVE format tag this GUID maps, if it is a FOURCCMap GUID with a 16-bit code
    pub fn wave_format_tag(&self) -> Option<u16> {
        self.fourcc().and_then(|code| u16::try_from(code.0).ok())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for Guid {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Registry form: `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`, uppercase hex
impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{:X}}}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid GUID {0:?}")]
pub struct ParseGuidError(pub String);

impl FromStr for Guid {
    type Err = ParseGuidError;

    /// Accepts the braced registry form or a plain hyphenated string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(trimmed);
        Uuid::try_parse(inner)
            .map(Self)
            .map_err(|_| ParseGuidError(s.to_string()))
    }
}
