// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use vidout::constants::{self, image_sink, terminal};

#[test]
fn test_codec_table_bounds() {
    assert_eq!(constants::CODECS_MAX_FOURCC, 92);
    assert_eq!(constants::CODECS_MAX_OUTFMT, 16);
    assert_eq!(constants::CODECS_MAX_INFMT, 16);
}

#[test]
fn test_image_sink_defaults_are_in_range() {
    assert!(image_sink::DEFAULT_MAX_FILES > 0);
    assert!(image_sink::DEFAULT_JPEG_QUALITY <= 100);
    assert!(image_sink::DEFAULT_PNG_COMPRESSION <= 9);
}

#[test]
fn test_equalizer_range_is_symmetric() {
    assert_eq!(terminal::EQUALIZER_MIN, -terminal::EQUALIZER_MAX);
}

#[test]
fn test_version_is_set() {
    assert!(!constants::VERSION.is_empty());
}
