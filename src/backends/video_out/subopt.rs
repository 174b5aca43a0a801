// SPDX-License-Identifier: GPL-3.0-only

//! Driver sub-option parsing
//!
//! Sub-options follow the driver name in a driver list (`pnm:pgm:outdir=out`).
//! Options are separated by `:`. Boolean options are given bare (`ascii`)
//! or negated with a `no` prefix (`noascii`). Other options take `=value`,
//! where a string value is either plain (up to the next `:`), `"quoted"`,
//! or length-prefixed as `%len%raw` so it may contain `:` or `"`.

use std::collections::HashMap;

/// Validation applied to integer options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntCheck {
    /// `> 0`
    Positive,
    /// `>= 0`
    NonNegative,
    /// Inclusive range
    Range(i64, i64),
}

impl IntCheck {
    fn accepts(self, value: i64) -> bool {
        match self {
            IntCheck::Positive => value > 0,
            IntCheck::NonNegative => value >= 0,
            IntCheck::Range(min, max) => (min..=max).contains(&value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptKind {
    Bool,
    Int(Option<IntCheck>),
    Str,
}

/// One accepted option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptSpec {
    pub name: &'static str,
    pub kind: OptKind,
}

impl OptSpec {
    pub const fn flag(name: &'static str) -> Self {
        Self {
            name,
            kind: OptKind::Bool,
        }
    }

    pub const fn int(name: &'static str, check: Option<IntCheck>) -> Self {
        Self {
            name,
            kind: OptKind::Int(check),
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: OptKind::Str,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubOptError {
    #[error("unknown suboption '{0}'")]
    Unknown(String),
    #[error("suboption '{0}' needs a value")]
    MissingValue(String),
    #[error("suboption '{0}' does not take a value")]
    UnexpectedValue(String),
    #[error("invalid value for suboption '{name}': {value:?}")]
    InvalidValue { name: String, value: String },
    #[error("value {value} for suboption '{name}' is out of range")]
    OutOfRange { name: String, value: i64 },
}

/// Parsed sub-options; later occurrences override earlier ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubOptions {
    values: HashMap<&'static str, OptValue>,
}

impl SubOptions {
    /// Parse `input` against `specs`
    pub fn parse(input: &str, specs: &[OptSpec]) -> Result<Self, SubOptError> {
        let mut values = HashMap::new();
        let mut rest = input;

        while !rest.is_empty() {
            let name_end = rest.find(['=', ':']).unwrap_or(rest.len());
            let name = &rest[..name_end];
            let has_value = rest[name_end..].starts_with('=');
            rest = &rest[name_end..];

            if name.is_empty() {
                // Tolerate empty entries such as a trailing ':'
                rest = rest.strip_prefix(':').unwrap_or(rest);
                if has_value {
                    return Err(SubOptError::Unknown(String::new()));
                }
                continue;
            }

            let (spec, negated) = lookup(specs, name).ok_or_else(|| SubOptError::Unknown(name.to_string()))?;

            let value = match spec.kind {
                OptKind::Bool => {
                    if has_value {
                        return Err(SubOptError::UnexpectedValue(name.to_string()));
                    }
                    OptValue::Bool(!negated)
                }
                OptKind::Int(check) => {
                    if !has_value {
                        return Err(SubOptError::MissingValue(name.to_string()));
                    }
                    let raw_end = rest[1..].find(':').map_or(rest.len(), |i| i + 1);
                    let raw = &rest[1..raw_end];
                    rest = &rest[raw_end..];
                    let value = parse_int(raw).ok_or_else(|| SubOptError::InvalidValue {
                        name: name.to_string(),
                        value: raw.to_string(),
                    })?;
                    if let Some(check) = check
                        && !check.accepts(value)
                    {
                        return Err(SubOptError::OutOfRange {
                            name: name.to_string(),
                            value,
                        });
                    }
                    OptValue::Int(value)
                }
                OptKind::Str => {
                    if !has_value {
                        return Err(SubOptError::MissingValue(name.to_string()));
                    }
                    let (text, remaining) = parse_string(name, &rest[1..])?;
                    rest = remaining;
                    OptValue::Str(text)
                }
            };
            values.insert(spec.name, value);

            match rest.strip_prefix(':') {
                Some(next) => rest = next,
                None if rest.is_empty() => {}
                None => {
                    return Err(SubOptError::InvalidValue {
                        name: name.to_string(),
                        value: rest.to_string(),
                    });
                }
            }
        }
        Ok(Self { values })
    }

    /// Value of a boolean option; `None` when not given
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(OptValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// True when the flag was given (and not negated)
    pub fn is_set(&self, name: &str) -> bool {
        self.flag(name).unwrap_or(false)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(OptValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Find the option entry for `name`, also accepting `no<flag>` for booleans
fn lookup<'s>(specs: &'s [OptSpec], name: &str) -> Option<(&'s OptSpec, bool)> {
    if let Some(spec) = specs.iter().find(|s| s.name == name) {
        return Some((spec, false));
    }
    let base = name.strip_prefix("no")?;
    specs
        .iter()
        .find(|s| s.name == base && s.kind == OptKind::Bool)
        .map(|s| (s, true))
}

/// Decimal, `0x` hex or leading-zero octal, with an optional sign
fn parse_int(raw: &str) -> Option<i64> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let value = i64::from(crate::media::formats::parse_c_ulong(digits)?);
    Some(if negative { -value } else { value })
}

/// Parse a string value at the start of `input`, returning it and the unparsed rest
fn parse_string<'a>(name: &str, input: &'a str) -> Result<(String, &'a str), SubOptError> {
    let invalid = || SubOptError::InvalidValue {
        name: name.to_string(),
        value: input.to_string(),
    };

    if let Some(quoted) = input.strip_prefix('"') {
        let end = quoted.find('"').ok_or_else(invalid)?;
        return Ok((quoted[..end].to_string(), &quoted[end + 1..]));
    }

    if let Some(prefixed) = input.strip_prefix('%') {
        let len_end = prefixed.find('%').ok_or_else(invalid)?;
        let len: usize = prefixed[..len_end].parse().map_err(|_| invalid())?;
        let body = &prefixed[len_end + 1..];
        let value = body.get(..len).ok_or_else(invalid)?;
        return Ok((value.to_string(), &body[len..]));
    }

    let end = input.find(':').unwrap_or(input.len());
    Ok((input[..end].to_string(), &input[end..]))
}
