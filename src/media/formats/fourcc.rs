// SPDX-License-Identifier: GPL-3.0-only

//! Four-character codes

use std::fmt;
use std::str::FromStr;

/// A FourCC packed little-endian the way `mmioFOURCC` packs it:
/// the first character lives in the lowest byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc(pub u32);

impl FourCc {
    /// Pack four bytes into a FourCC
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(
            bytes[0] as u32
                | (bytes[1] as u32) << 8
                | (bytes[2] as u32) << 16
                | (bytes[3] as u32) << 24,
        )
    }

    /// Pack the first four bytes of `s`, or `None` when it is shorter
    pub fn from_prefix(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() < 4 {
            return None;
        }
        Some(Self::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// The four bytes in stream order
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// True when every byte is printable ASCII
    pub fn is_printable(self) -> bool {
        self.to_bytes().iter().all(|b| b.is_ascii_graphic() || *b == b' ')
    }
}

impl From<u32> for FourCc {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<FourCc> for u32 {
    fn from(value: FourCc) -> Self {
        value.0
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_printable() {
            for b in self.to_bytes() {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08X}", self.0)
        }
    }
}

/// Error for strings that are neither four characters nor a number
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid FourCC: {0:?}")]
pub struct ParseFourCcError(pub String);

impl FromStr for FourCc {
    type Err = ParseFourCcError;

    /// Accepts exactly four characters (`DIVX`) or a C-style number (`0x55`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 4
            && let Some(code) = Self::from_prefix(s)
        {
            return Ok(code);
        }
        parse_c_ulong(s)
            .map(Self)
            .ok_or_else(|| ParseFourCcError(s.to_string()))
    }
}

/// Parse an unsigned integer the way `strtoul(s, &end, 0)` does, requiring
/// the whole string to be consumed: `0x`/`0X` hex, leading `0` octal, else decimal.
pub fn parse_c_ulong(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() {
        return None;
    }
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_matches_mmio_layout() {
        let divx = FourCc::from_bytes(*b"DIVX");
        assert_eq!(divx.0, 0x5856_4944);
        assert_eq!(divx.to_bytes(), *b"DIVX");
        assert_eq!(divx.to_string(), "DIVX");
    }

    #[test]
    fn test_non_printable_displays_hex() {
        assert_eq!(FourCc(0x55).to_string(), "0x00000055");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("YV12".parse::<FourCc>().unwrap(), FourCc::from_bytes(*b"YV12"));
        assert_eq!("0x55".parse::<FourCc>().unwrap(), FourCc(0x55));
        assert_eq!("85".parse::<FourCc>().unwrap(), FourCc(85));
        assert!("ABC".parse::<FourCc>().is_err());
    }

    #[test]
    fn test_parse_c_ulong_bases() {
        assert_eq!(parse_c_ulong("0x1F"), Some(31));
        assert_eq!(parse_c_ulong("017"), Some(15));
        assert_eq!(parse_c_ulong("0"), Some(0));
        assert_eq!(parse_c_ulong("42"), Some(42));
        assert_eq!(parse_c_ulong("42x"), None);
        assert_eq!(parse_c_ulong("0x"), None);
        assert_eq!(parse_c_ulong(""), None);
        assert_eq!(parse_c_ulong("089"), None);
    }
}
