// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the codec table

use vidout::codecs::{CodecKind, CodecStatus, CodecTable};
use vidout::errors::{CodecConfigError, CodecParseErrorKind};
use vidout::{FourCc, Guid, ImgFmt};

fn fourcc(code: &[u8; 4]) -> FourCc {
    FourCc::from_bytes(*code)
}

#[test]
fn test_builtin_table_parses() {
    let table = CodecTable::builtin().unwrap();
    assert!(!table.video().is_empty());
    assert!(!table.audio().is_empty());

    // Every video codec has a driver and at least one output format
    for codec in table.video() {
        assert!(!codec.driver.is_empty(), "{} has no driver", codec.name);
        assert!(codec.outputs().next().is_some(), "{} has no output", codec.name);
    }
}

#[test]
fn test_builtin_lookup_and_aliases() {
    let table = CodecTable::builtin().unwrap();

    let hit = table.find_codec(fourcc(b"XVID"), CodecKind::Video, None, false).unwrap();
    assert_eq!(hit.codec.name, "ffodivx");
    assert_eq!(hit.map, Some(fourcc(b"XVID")));

    let hit = table.find_codec(fourcc(b"MP43"), CodecKind::Video, None, false).unwrap();
    assert_eq!(hit.codec.name, "divxds");
    assert_eq!(hit.map, Some(fourcc(b"div3")));
    assert_eq!(hit.codec.status, CodecStatus::Problems);

    let mp3 = table.find_codec(FourCc(0x55), CodecKind::Audio, None, false).unwrap();
    assert_eq!(mp3.codec.name, "ffmp3");
}

#[test]
fn test_builtin_fallback_chain() {
    let table = CodecTable::builtin().unwrap();
    let names: Vec<&str> = table
        .selector(fourcc(b"mpg2"), CodecKind::Video, false)
        .map(|m| m.codec.name.as_str())
        .collect();
    assert_eq!(names, vec!["ffmpeg2", "ffmpeg12vdpau", "null"]);
}

#[test]
fn test_builtin_guid_maps_to_registry_string() {
    let table = CodecTable::builtin().unwrap();
    let divx = table.get(CodecKind::Video, "divxds").unwrap();
    let guid = divx.guid.unwrap();
    assert_eq!(guid.to_string(), "{82CCD3E0-F71A-11D0-9FE5-00609778AAAA}");
    assert_eq!(guid.to_string().parse::<Guid>().unwrap(), guid);
}

#[test]
fn test_user_file_overrides_builtin() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("codecs.conf");
    std::fs::write(
        &path,
        "release 20990101\nvideocodec mine\n  info \"My decoder\"\n  fourcc MINE\n  driver mydrv\n  out I420\n",
    )
    .unwrap();

    let table = CodecTable::load(Some(&path)).unwrap();
    assert_eq!(table.video().len(), 1);
    let codec = &table.video()[0];
    assert_eq!(codec.info, "My decoder");
    assert_eq!(codec.outputs().collect::<Vec<_>>(), vec![ImgFmt::I420]);
    assert!(table.audio().is_empty());
}

#[test]
fn test_missing_user_file_uses_builtin() {
    let tmp = tempfile::tempdir().unwrap();
    let table = CodecTable::load(Some(&tmp.path().join("absent.conf"))).unwrap();
    assert_eq!(table, CodecTable::builtin().unwrap());
    assert!(CodecTable::load_optional(&tmp.path().join("absent.conf")).unwrap().is_none());
}

#[test]
fn test_old_user_file_falls_back_to_builtin() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("codecs.conf");
    std::fs::write(&path, "release 20000101\n").unwrap();

    let err = CodecTable::load_optional(&path).unwrap_err();
    assert_eq!(err.line(), Some(1));
    assert!(matches!(err.kind(), Some(CodecParseErrorKind::ReleaseTooOld { found: 20000101, .. })));

    let table = CodecTable::load(Some(&path)).unwrap();
    assert_eq!(table, CodecTable::builtin().unwrap());
}

#[test]
fn test_broken_user_file_falls_back_to_builtin() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("codecs.conf");
    std::fs::write(&path, "release 20990101\nvideocodec a\n  bogus 1\n").unwrap();

    assert!(CodecTable::load_optional(&path).is_err());
    assert_eq!(CodecTable::load(Some(&path)).unwrap(), CodecTable::builtin().unwrap());
}

#[test]
fn test_parse_error_reports_line() {
    let err = CodecTable::parse_str("release 20990101\nvideocodec a\n  driver x\n  bogus 1\n").unwrap_err();
    assert!(matches!(err, CodecConfigError::Parse { line: 4, .. }));
    assert!(err.to_string().ends_with("at line 4"));
}

#[test]
fn test_listing_mentions_dlls() {
    let table = CodecTable::builtin().unwrap();
    let listing = table.list(CodecKind::Video);
    assert!(listing.starts_with("vc:"));
    assert!(listing.lines().any(|l| l.starts_with("divxds") && l.ends_with("[divx_c32.ax]")));
    assert_eq!(listing.lines().count(), table.video().len() + 1);
}
