// SPDX-License-Identifier: GPL-3.0-only

//! Error types shared across the crate

use crate::backends::video_out::VoError;
use std::path::PathBuf;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for codec configuration parsing and loading
pub type CodecResult<T> = Result<T, CodecConfigError>;

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Video output errors
    #[error("Video output error: {0}")]
    VideoOut(#[from] VoError),
    /// codecs.conf errors
    #[error("Codec configuration error: {0}")]
    CodecConfig(#[from] CodecConfigError),
    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

/// Errors from reading or parsing a codecs.conf file
#[derive(Debug, thiserror::Error)]
pub enum CodecConfigError {
    /// Syntax or validation error at a given line (1-based)
    #[error("{kind} at line {line}")]
    Parse { line: usize, kind: CodecParseErrorKind },
    /// The file exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exceeds the size we are willing to load
    #[error("{} is larger than {limit} bytes", path.display())]
    TooLarge { path: PathBuf, limit: u64 },
    /// The embedded codecs.conf is unavailable or has no release line
    #[error("builtin codecs.conf is missing or has no release line")]
    Builtin,
}

impl CodecConfigError {
    pub fn parse(line: usize, kind: CodecParseErrorKind) -> Self {
        CodecConfigError::Parse { line, kind }
    }

    /// Line number of a parse error
    pub fn line(&self) -> Option<usize> {
        match self {
            CodecConfigError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<&CodecParseErrorKind> {
        match self {
            CodecConfigError::Parse { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// What went wrong while parsing codecs.conf
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecParseErrorKind {
    #[error("codecs.conf has no release line and is too old for this release")]
    MissingRelease,
    #[error("codecs.conf release {found} is too old and incompatible with this release (need {required})")]
    ReleaseTooOld { found: i64, required: i64 },
    #[error("expected videocodec or audiocodec, found {0:?}")]
    ExpectedCodecBlock(String),
    #[error("unknown keyword {0:?}")]
    UnknownKeyword(String),
    #[error("{keyword} is missing its arguments")]
    MissingArgument { keyword: String },
    #[error("codec name '{0}' isn't unique")]
    DuplicateName(String),
    #[error("codec({0}) name is not valid")]
    InvalidName(String),
    #[error("codec({0}) does not have a driver")]
    MissingDriver(String),
    #[error("info given more than once")]
    DuplicateInfo,
    #[error("parse error in FourCC list {0:?}")]
    InvalidFourcc(String),
    #[error("duplicated FourCC")]
    DuplicatedFourcc,
    #[error("parse error (format ID not a number?) {0:?}")]
    InvalidFormatId(String),
    #[error("duplicated format ID")]
    DuplicatedFormatId,
    #[error("too many FourCCs/formats...")]
    TooManyFourccs,
    #[error("too many out/in formats...")]
    TooManyFormats,
    #[error("unknown image format in {0:?}")]
    UnknownImageFormat(String),
    #[error("unknown format flag in {0:?}")]
    UnknownFormatFlag(String),
    #[error("invalid GUID field {0:?}")]
    InvalidGuidField(String),
    #[error("unknown codec flag {0:?}")]
    UnknownCodecFlag(String),
    #[error("unknown status {0:?}")]
    UnknownStatus(String),
}

/// Errors from the JSON configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration directory on this platform")]
    NoConfigDir,
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown setting {0:?}")]
    UnknownKey(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_mentions_line() {
        let err = CodecConfigError::parse(7, CodecParseErrorKind::DuplicatedFourcc);
        assert_eq!(err.to_string(), "duplicated FourCC at line 7");
        assert_eq!(err.line(), Some(7));
        assert_eq!(err.kind(), Some(&CodecParseErrorKind::DuplicatedFourcc));
    }

    #[test]
    fn test_app_error_wraps_codec_error() {
        let err: AppError = CodecConfigError::Builtin.into();
        assert!(err.to_string().starts_with("Codec configuration error"));
        let other: AppError = "boom".into();
        assert_eq!(other.to_string(), "boom");
    }
}
