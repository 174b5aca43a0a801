// SPDX-License-Identifier: GPL-3.0-only

//! Codec configuration (codecs.conf)
//!
//! The codec table maps stream FourCCs and format ids to decoder
//! descriptors. It is built once from either a user `codecs.conf` or the
//! embedded default and then queried read-only.
//!
//! # Lookup
//!
//! [`CodecTable::find_codec`] scans one partition (video or audio) in file
//! order. [`CodecSelector`] repeats that scan, skipping codecs that were
//! already tried, which is how a player falls back from one decoder to
//! the next.

pub mod builtin;
pub mod parser;
pub mod tokenizer;
pub mod types;

pub use types::{CodecEntry, CodecFlags, CodecKind, CodecStatus, FormatSlot, FourccMapping, OutFlags};

use crate::constants::CODECS_CONF_MAX_BYTES;
use crate::errors::{CodecConfigError, CodecResult};
use crate::media::FourCc;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info, warn};

/// Parsed codec table, partitioned into video and audio codecs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecTable {
    video: Vec<CodecEntry>,
    audio: Vec<CodecEntry>,
}

/// A successful [`CodecTable::find_codec`] lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecMatch<'a> {
    /// Position in the partition; pass it back as `start` to continue the scan
    pub index: usize,
    pub codec: &'a CodecEntry,
    /// The code to hand the driver, when the codec listed the FourCC
    pub map: Option<FourCc>,
}

impl CodecTable {
    /// Parse the embedded codecs.conf
    pub fn builtin() -> CodecResult<Self> {
        let text = builtin::text()?;
        let release = builtin::release()?;
        parser::parse(&text, release)
    }

    /// Parse user codecs.conf text; its release must not be older than the embedded one
    pub fn parse_str(text: &str) -> CodecResult<Self> {
        parser::parse(text, builtin::release()?)
    }

    /// Read and parse `path`, or `Ok(None)` when the file does not exist
    pub fn load_optional(path: &Path) -> CodecResult<Option<Self>> {
        if !path.exists() {
            debug!(path = %path.display(), "No optional codecs config file");
            return Ok(None);
        }
        info!(path = %path.display(), "Reading codec config file");

        let read_error = |source| CodecConfigError::Read {
            path: path.to_path_buf(),
            source,
        };
        let size = std::fs::metadata(path).map_err(read_error)?.len();
        if size > CODECS_CONF_MAX_BYTES {
            return Err(CodecConfigError::TooLarge {
                path: path.to_path_buf(),
                limit: CODECS_CONF_MAX_BYTES,
            });
        }
        let bytes = std::fs::read(path).map_err(read_error)?;
        let text = String::from_utf8_lossy(&bytes);
        Self::parse_str(&text).map(Some)
    }

    /// Use the user file when present and usable, otherwise the embedded table.
    ///
    /// A user file that cannot be read, is too old or fails to parse is
    /// reported and skipped.
    pub fn load(path: Option<&Path>) -> CodecResult<Self> {
        if let Some(path) = path {
            match Self::load_optional(path) {
                Ok(Some(table)) => return Ok(table),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring codecs config file"),
            }
        }
        Self::builtin()
    }

    pub fn video(&self) -> &[CodecEntry] {
        &self.video
    }

    pub fn audio(&self) -> &[CodecEntry] {
        &self.audio
    }

    pub fn codecs(&self, kind: CodecKind) -> &[CodecEntry] {
        match kind {
            CodecKind::Video => &self.video,
            CodecKind::Audio => &self.audio,
        }
    }

    /// Codec by name within one partition
    pub fn get(&self, kind: CodecKind, name: &str) -> Option<&CodecEntry> {
        self.codecs(kind).iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }

    /// Find the first codec for `fourcc`, starting after index `start`.
    ///
    /// A codec that lists the code matches and reports its mapping. A codec
    /// marked `anyinput` matches anything, as does every codec when `force` is set.
    pub fn find_codec(&self, fourcc: FourCc, kind: CodecKind, start: Option<usize>, force: bool) -> Option<CodecMatch<'_>> {
        let first = start.map_or(0, |idx| idx + 1);
        self.codecs(kind)
            .iter()
            .enumerate()
            .skip(first)
            .find_map(|(index, codec)| {
                if let Some(map) = codec.map_fourcc(fourcc) {
                    Some(CodecMatch {
                        index,
                        codec,
                        map: Some(map),
                    })
                } else if codec.anyinput || force {
                    Some(CodecMatch { index, codec, map: None })
                } else {
                    None
                }
            })
    }

    /// Iterate the codecs that can handle `fourcc`, each name at most once
    pub fn selector(&self, fourcc: FourCc, kind: CodecKind, force: bool) -> CodecSelector<'_> {
        CodecSelector {
            table: self,
            fourcc,
            kind,
            force,
            last: None,
            tried: HashSet::new(),
        }
    }

    /// The codec listing: a header line and one line per codec
    pub fn list(&self, kind: CodecKind) -> String {
        let mut out = String::new();
        let _ = match kind {
            CodecKind::Audio => writeln!(out, "ac:     afm:      status:   info:  [lib/dll]"),
            CodecKind::Video => writeln!(out, "vc:     vfm:      status:   info:  [lib/dll]"),
        };
        for codec in self.codecs(kind) {
            let _ = write!(
                out,
                "{:<11} {:<9} {}  {}",
                codec.name,
                codec.driver,
                codec.status.label(),
                codec.info
            );
            if let Some(dll) = &codec.dll {
                let _ = write!(out, "  [{dll}]");
            }
            out.push('\n');
        }
        out
    }
}

/// Successive codec candidates for one FourCC, skipping names already tried
#[derive(Debug, Clone)]
pub struct CodecSelector<'a> {
    table: &'a CodecTable,
    fourcc: FourCc,
    kind: CodecKind,
    force: bool,
    last: Option<usize>,
    tried: HashSet<String>,
}

impl<'a> CodecSelector<'a> {
    /// Skip `name` from now on (e.g. a codec that failed in an earlier pass)
    pub fn mark_tried(&mut self, name: &str) {
        self.tried.insert(name.to_string());
    }

    pub fn is_tried(&self, name: &str) -> bool {
        self.tried.contains(name)
    }

    /// Carry the set of tried names into another selector
    pub fn with_tried(mut self, tried: HashSet<String>) -> Self {
        self.tried.extend(tried);
        self
    }

    pub fn into_tried(self) -> HashSet<String> {
        self.tried
    }
}

impl<'a> Iterator for CodecSelector<'a> {
    type Item = CodecMatch<'a>;

    fn next(&mut self) -> Option<CodecMatch<'a>> {
        loop {
            let found = self.table.find_codec(self.fourcc, self.kind, self.last, self.force)?;
            self.last = Some(found.index);
            if self.tried.insert(found.codec.name.clone()) {
                return Some(found);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONF: &str = "release 100
videocodec first
  driver a
  fourcc AAAA
videocodec catchall
  driver b
  anyinput
videocodec second
  driver c
  fourcc AAAA,BBBB CCCC
  dll second.so
audiocodec pcm
  driver pcm
  format 0x1
";

    fn table() -> CodecTable {
        parser::parse(CONF, 100).unwrap()
    }

    #[test]
    fn test_find_codec_order_and_start() {
        let table = table();
        let aaaa = FourCc::from_bytes(*b"AAAA");
        let hit = table.find_codec(aaaa, CodecKind::Video, None, false).unwrap();
        assert_eq!((hit.index, hit.codec.name.as_str(), hit.map), (0, "first", Some(aaaa)));

        let hit = table.find_codec(aaaa, CodecKind::Video, Some(0), false).unwrap();
        assert_eq!(hit.codec.name, "catchall");
        assert_eq!(hit.map, None);

        let hit = table.find_codec(aaaa, CodecKind::Video, Some(1), false).unwrap();
        assert_eq!(hit.codec.name, "second");
        assert_eq!(hit.map, Some(FourCc::from_bytes(*b"CCCC")));

        assert!(table.find_codec(aaaa, CodecKind::Video, Some(2), false).is_none());
    }

    #[test]
    fn test_find_codec_force() {
        let table = table();
        let code = FourCc::from_bytes(*b"ZZZZ");
        assert!(table.find_codec(code, CodecKind::Audio, None, false).is_none());
        let hit = table.find_codec(code, CodecKind::Audio, None, true).unwrap();
        assert_eq!(hit.codec.name, "pcm");
    }

    #[test]
    fn test_selector_skips_tried() {
        let table = table();
        let names: Vec<&str> = table
            .selector(FourCc::from_bytes(*b"BBBB"), CodecKind::Video, false)
            .map(|m| m.codec.name.as_str())
            .collect();
        assert_eq!(names, vec!["catchall", "second"]);

        let mut selector = table.selector(FourCc::from_bytes(*b"AAAA"), CodecKind::Video, false);
        selector.mark_tried("catchall");
        let names: Vec<&str> = selector.map(|m| m.codec.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_list_format() {
        let listing = table().list(CodecKind::Video);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "vc:     vfm:      status:   info:  [lib/dll]");
        assert_eq!(lines[1], "first       a         problems  first");
        assert_eq!(lines[3], "second      c         problems  second  [second.so]");
        assert!(table().list(CodecKind::Audio).starts_with("ac:"));
    }

    #[test]
    fn test_get_by_name() {
        let table = table();
        assert!(table.get(CodecKind::Audio, "pcm").is_some());
        assert!(table.get(CodecKind::Video, "pcm").is_none());
    }
}
