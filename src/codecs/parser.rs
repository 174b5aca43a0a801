// SPDX-License-Identifier: GPL-3.0-only

//! codecs.conf grammar
//!
//! A file starts with `release N`, followed by `videocodec NAME` and
//! `audiocodec NAME` blocks. Every statement keyword takes its arguments
//! from the same line; a line may hold several statements.

use super::CodecTable;
use super::tokenizer::token_lines;
use super::types::{CodecEntry, CodecFlags, CodecKind, CodecStatus, FormatSlot, FourccMapping, OutFlags};
use crate::constants::{CODECS_MAX_FOURCC, CODECS_MAX_INFMT, CODECS_MAX_OUTFMT};
use crate::errors::{CodecConfigError, CodecParseErrorKind as Kind, CodecResult};
use crate::media::formats::{FourCc, ImgFmt, parse_c_ulong};
use crate::media::Guid;
use tracing::debug;

/// Parse codecs.conf text, requiring a release line of at least `min_release`
pub fn parse(text: &str, min_release: i64) -> CodecResult<CodecTable> {
    let mut parser = Parser::default();
    let mut last_line = 0;
    for (line, tokens) in token_lines(text) {
        last_line = line;
        let mut tokens = tokens.into_iter();
        while let Some(keyword) = tokens.next() {
            parser
                .statement(keyword, &mut tokens, min_release)
                .map_err(|kind| CodecConfigError::parse(line, kind))?;
        }
    }
    parser
        .finish_block()
        .map_err(|kind| CodecConfigError::parse(last_line, kind))?;
    debug!(
        video = parser.table.video.len(),
        audio = parser.table.audio.len(),
        "Parsed codec configuration"
    );
    Ok(parser.table)
}

/// C `atoi`: optional sign and leading digits, anything else ignored, 0 when none
pub fn atoi(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    sign * value
}

#[derive(Debug, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    ExpectRelease,
    ExpectBlock,
    InBlock,
}

/// A codec block under construction
#[derive(Debug, Default)]
struct Block {
    entry: CodecEntry,
    info: Option<String>,
    driver: Option<String>,
}

#[derive(Debug, Default)]
struct Parser {
    table: CodecTable,
    stage: Stage,
    block: Option<Block>,
}

impl Parser {
    fn statement<'a>(
        &mut self,
        keyword: &str,
        args: &mut impl Iterator<Item = &'a str>,
        min_release: i64,
    ) -> Result<(), Kind> {
        match self.stage {
            Stage::ExpectRelease => {
                if keyword != "release" {
                    return Err(Kind::MissingRelease);
                }
                let found = atoi(required(keyword, args)?);
                if found < min_release {
                    return Err(Kind::ReleaseTooOld {
                        found,
                        required: min_release,
                    });
                }
                self.stage = Stage::ExpectBlock;
                Ok(())
            }
            Stage::ExpectBlock => match CodecKind::from_keyword(keyword) {
                Some(kind) => self.start_block(kind, required(keyword, args)?),
                None => Err(Kind::ExpectedCodecBlock(keyword.to_string())),
            },
            Stage::InBlock => {
                if let Some(kind) = CodecKind::from_keyword(keyword) {
                    self.finish_block()?;
                    return self.start_block(kind, required(keyword, args)?);
                }
                let Some(block) = self.block.as_mut() else {
                    return Err(Kind::UnknownKeyword(keyword.to_string()));
                };
                block.statement(keyword, args)
            }
        }
    }

    fn start_block(&mut self, kind: CodecKind, name: &str) -> Result<(), Kind> {
        if self.table.codecs(kind).iter().any(|c| c.name == name) {
            return Err(Kind::DuplicateName(name.to_string()));
        }
        self.block = Some(Block {
            entry: CodecEntry {
                name: name.to_string(),
                kind,
                ..Default::default()
            },
            info: None,
            driver: None,
        });
        self.stage = Stage::InBlock;
        Ok(())
    }

    /// Validate the open block and move it into the table
    fn finish_block(&mut self) -> Result<(), Kind> {
        let Some(block) = self.block.take() else {
            return Ok(());
        };
        let mut entry = block.entry;
        if entry.name.is_empty() || !entry.name.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Kind::InvalidName(entry.name));
        }
        let Some(driver) = block.driver else {
            return Err(Kind::MissingDriver(entry.name));
        };
        entry.driver = driver;
        entry.info = block.info.unwrap_or_else(|| entry.name.clone());
        match entry.kind {
            CodecKind::Video => self.table.video.push(entry),
            CodecKind::Audio => self.table.audio.push(entry),
        }
        Ok(())
    }
}

impl Block {
    fn statement<'a>(&mut self, keyword: &str, args: &mut impl Iterator<Item = &'a str>) -> Result<(), Kind> {
        let entry = &mut self.entry;
        match keyword {
            "info" => {
                if self.info.is_some() {
                    return Err(Kind::DuplicateInfo);
                }
                self.info = Some(required(keyword, args)?.to_string());
            }
            "comment" => {
                let text = required(keyword, args)?;
                match entry.comment.as_mut() {
                    Some(comment) => {
                        comment.push('\n');
                        comment.push_str(text);
                    }
                    None => entry.comment = Some(text.to_string()),
                }
            }
            "fourcc" => {
                let list = required(keyword, args)?;
                add_fourccs(&mut entry.fourcc, list, args.next())?;
            }
            "format" => {
                let id = required(keyword, args)?;
                add_format(&mut entry.fourcc, id, args.next())?;
            }
            "driver" => self.driver = Some(required(keyword, args)?.to_string()),
            "dll" => entry.dll = Some(required(keyword, args)?.to_string()),
            "guid" => {
                let fields: Vec<&str> = args.take(11).collect();
                if fields.len() < 11 {
                    return Err(missing(keyword));
                }
                entry.guid = Some(parse_guid(&fields)?);
            }
            "out" => {
                let formats = required(keyword, args)?;
                add_formats(&mut entry.outfmt, CODECS_MAX_OUTFMT, formats, args.next())?;
            }
            "in" => {
                let formats = required(keyword, args)?;
                add_formats(&mut entry.infmt, CODECS_MAX_INFMT, formats, args.next())?;
            }
            "flags" => match required(keyword, args)? {
                "seekable" => entry.flags |= CodecFlags::SEEKABLE,
                "align16" => entry.flags |= CodecFlags::ALIGN16,
                other => return Err(Kind::UnknownCodecFlag(other.to_string())),
            },
            "status" => {
                let word = required(keyword, args)?;
                entry.status = CodecStatus::from_keyword(word).ok_or_else(|| Kind::UnknownStatus(word.to_string()))?;
            }
            "anyinput" => entry.anyinput = true,
            other => return Err(Kind::UnknownKeyword(other.to_string())),
        }
        Ok(())
    }
}

fn missing(keyword: &str) -> Kind {
    Kind::MissingArgument {
        keyword: keyword.to_string(),
    }
}

fn required<'a>(keyword: &str, args: &mut impl Iterator<Item = &'a str>) -> Result<&'a str, Kind> {
    args.next().ok_or_else(|| missing(keyword))
}

/// `ABCD,EFGH [ALIAS]`
fn add_fourccs(slots: &mut Vec<FourccMapping>, list: &str, alias: Option<&str>) -> Result<(), Kind> {
    if slots.len() >= CODECS_MAX_FOURCC {
        return Err(Kind::TooManyFourccs);
    }
    let alias = match alias {
        Some(a) => Some(FourCc::from_prefix(a).ok_or_else(|| Kind::InvalidFourcc(a.to_string()))?),
        None => None,
    };
    for code in list.split(',') {
        if code.len() != 4 {
            return Err(Kind::InvalidFourcc(list.to_string()));
        }
        let fourcc = FourCc::from_prefix(code).ok_or_else(|| Kind::InvalidFourcc(list.to_string()))?;
        if slots.iter().any(|m| m.fourcc == fourcc) {
            return Err(Kind::DuplicatedFourcc);
        }
        if slots.len() >= CODECS_MAX_FOURCC {
            return Err(Kind::TooManyFourccs);
        }
        slots.push(FourccMapping {
            fourcc,
            map: alias.unwrap_or(fourcc),
        });
    }
    Ok(())
}

/// `ID [ALIAS]`, numbers in C notation
fn add_format(slots: &mut Vec<FourccMapping>, id: &str, alias: Option<&str>) -> Result<(), Kind> {
    if slots.len() >= CODECS_MAX_FOURCC {
        return Err(Kind::TooManyFourccs);
    }
    let fourcc = parse_c_ulong(id)
        .map(FourCc)
        .ok_or_else(|| Kind::InvalidFormatId(id.to_string()))?;
    let map = match alias {
        Some(a) => parse_c_ulong(a)
            .map(FourCc)
            .ok_or_else(|| Kind::InvalidFormatId(a.to_string()))?,
        None => fourcc,
    };
    if slots.iter().any(|m| m.fourcc == fourcc) {
        return Err(Kind::DuplicatedFormatId);
    }
    slots.push(FourccMapping { fourcc, map });
    Ok(())
}

/// `FMT,FMT [FLAG,FLAG]`; the flags apply to every format on the line
fn add_formats(slots: &mut Vec<FormatSlot>, max: usize, formats: &str, flags: Option<&str>) -> Result<(), Kind> {
    if slots.len() >= max {
        return Err(Kind::TooManyFormats);
    }
    let mut parsed_flags = OutFlags::empty();
    if let Some(list) = flags {
        for word in list.split(',') {
            let (_, flag) = OutFlags::KEYWORDS
                .iter()
                .find(|(name, _)| *name == word)
                .ok_or_else(|| Kind::UnknownFormatFlag(list.to_string()))?;
            parsed_flags |= *flag;
        }
    }
    for name in formats.split(',') {
        if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(Kind::UnknownImageFormat(formats.to_string()));
        }
        let format = ImgFmt::from_name(name).ok_or_else(|| Kind::UnknownImageFormat(formats.to_string()))?;
        if slots.len() >= max {
            return Err(Kind::TooManyFormats);
        }
        slots.push(FormatSlot {
            format,
            flags: parsed_flags,
        });
    }
    Ok(())
}

/// Eleven numbers, each optionally followed by one comma
fn parse_guid(fields: &[&str]) -> Result<Guid, Kind> {
    let numbers = fields
        .iter()
        .map(|field| {
            let digits = field.strip_suffix(',').unwrap_or(field);
            parse_c_ulong(digits).ok_or_else(|| Kind::InvalidGuidField(field.to_string()))
        })
        .collect::<Result<Vec<u32>, Kind>>()?;

    let narrow16 = |idx: usize| u16::try_from(numbers[idx]).map_err(|_| Kind::InvalidGuidField(fields[idx].to_string()));
    let narrow8 = |idx: usize| u8::try_from(numbers[idx]).map_err(|_| Kind::InvalidGuidField(fields[idx].to_string()));

    let mut data4 = [0u8; 8];
    for (i, byte) in data4.iter_mut().enumerate() {
        *byte = narrow8(i + 3)?;
    }
    Ok(Guid::from_fields(numbers[0], narrow16(1)?, narrow16(2)?, data4))
}
