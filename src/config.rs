// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::image_sink::DEFAULT_OUTDIR;
use crate::constants::render::DEFAULT_FPS;
use crate::constants::{APP_DIR_NAME, CODECS_CONF_FILE_NAME};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the settings file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Driver list tried by `play` when `--vo` is not given
    pub video_out: String,
    /// User codecs.conf; `None` uses the file in the config directory
    pub codecs_conf: Option<PathBuf>,
    /// Output directory for the file sinks
    pub output_dir: PathBuf,
    /// Frame rate when the source has none
    pub fps: u32,
    /// tracing filter used when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Trailing comma: fall back to the autoprobe drivers
            video_out: String::from("tct,"),
            codecs_conf: None,
            output_dir: PathBuf::from(DEFAULT_OUTDIR),
            fps: DEFAULT_FPS,
            log_filter: String::from("warn"),
        }
    }
}

impl Config {
    /// `dirs::config_dir()/vidout`
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR_NAME))
    }

    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Load from the config directory, falling back to defaults with a warning
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            warn!("No configuration directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(io_err)
    }

    /// Change one setting from its `key=value` command-line form.
    ///
    /// An empty `codecs_conf` value clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "video_out" => self.video_out = value.to_string(),
            "codecs_conf" => self.codecs_conf = (!value.is_empty()).then(|| PathBuf::from(value)),
            "output_dir" if !value.is_empty() => self.output_dir = PathBuf::from(value),
            "fps" => self.fps = value.parse().ok().filter(|fps| *fps > 0).ok_or_else(invalid)?,
            "log_filter" if !value.is_empty() => self.log_filter = value.to_string(),
            "output_dir" | "log_filter" => return Err(invalid()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// The user codecs.conf to load, if any location is known
    pub fn codecs_conf_path(&self) -> Option<PathBuf> {
        self.codecs_conf
            .clone()
            .or_else(|| Self::dir().map(|d| d.join(CODECS_CONF_FILE_NAME)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "video_out": "pnm:pgm", "fps": 30 }"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.video_out, "pnm:pgm");
        assert_eq!(config.fps, 30);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_invalid_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_set_from_command_line() {
        let mut config = Config::default();
        config.set("video_out", "pnm:ppm,null").unwrap();
        config.set("fps", "30").unwrap();
        config.set("codecs_conf", "/etc/codecs.conf").unwrap();
        assert_eq!(config.video_out, "pnm:ppm,null");
        assert_eq!(config.fps, 30);
        assert_eq!(config.codecs_conf, Some(PathBuf::from("/etc/codecs.conf")));

        config.set("codecs_conf", "").unwrap();
        assert_eq!(config.codecs_conf, None);

        assert!(matches!(config.set("fps", "0"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(config.set("output_dir", ""), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(config.set("volume", "3"), Err(ConfigError::UnknownKey(_))));
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn test_explicit_codecs_conf_wins() {
        let config = Config {
            codecs_conf: Some(PathBuf::from("/etc/codecs.conf")),
            ..Config::default()
        };
        assert_eq!(config.codecs_conf_path(), Some(PathBuf::from("/etc/codecs.conf")));
    }
}
