// SPDX-License-Identifier: GPL-3.0-only

//! The codecs.conf compiled into the binary

use super::parser::atoi;
use crate::constants::CODECS_CONF_FILE_NAME;
use crate::errors::{CodecConfigError, CodecResult};
use rust_embed::RustEmbed;
use std::borrow::Cow;

#[derive(RustEmbed)]
#[folder = "resources/"]
struct Resources;

/// Text of the embedded codecs.conf
pub fn text() -> CodecResult<Cow<'static, str>> {
    let file = Resources::get(CODECS_CONF_FILE_NAME).ok_or(CodecConfigError::Builtin)?;
    match file.data {
        Cow::Borrowed(bytes) => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| CodecConfigError::Builtin),
        Cow::Owned(bytes) => String::from_utf8(bytes)
            .map(Cow::Owned)
            .map_err(|_| CodecConfigError::Builtin),
    }
}

/// The release number of the embedded file; user files must be at least this new
pub fn release() -> CodecResult<i64> {
    let text = text()?;
    text.lines()
        .find_map(|line| line.strip_prefix("release "))
        .map(atoi)
        .ok_or(CodecConfigError::Builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_release() {
        assert!(release().unwrap() > 0);
        assert!(text().unwrap().contains("videocodec"));
    }
}
