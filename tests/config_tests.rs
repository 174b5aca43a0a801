// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use vidout::Config;

#[test]
fn test_config_default() {
    let config = Config::default();

    // The default driver list ends with ',' so autoprobe drivers are tried
    assert!(config.video_out.ends_with(','), "Default list should fall back to autoprobe");
    assert_eq!(config.fps, 25);
    assert_eq!(config.log_filter, "warn");
}

#[test]
fn test_config_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("config.json");

    let config = Config {
        video_out: "pnm:pgm,null".to_string(),
        fps: 50,
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_missing_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(Config::load_from(&tmp.path().join("absent.json")).is_err());
}

#[test]
fn test_config_set_then_save() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.json");

    let mut config = Config::default();
    config.set("output_dir", "frames").unwrap();
    config.set("log_filter", "vidout=debug").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.output_dir, std::path::PathBuf::from("frames"));
    assert_eq!(loaded.log_filter, "vidout=debug");
}
