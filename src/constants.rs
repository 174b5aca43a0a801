// SPDX-License-Identifier: GPL-3.0-only

//! Library-wide constants

/// Maximum number of FourCC/format ids a single codec entry may list
pub const CODECS_MAX_FOURCC: usize = 92;

/// Maximum number of output image formats per codec entry
pub const CODECS_MAX_OUTFMT: usize = 16;

/// Maximum number of input image formats per codec entry
pub const CODECS_MAX_INFMT: usize = 16;

/// Largest codecs.conf file we are willing to read into memory
pub const CODECS_CONF_MAX_BYTES: u64 = 10_000_000;

/// File name of the user codec configuration inside the config directory
pub const CODECS_CONF_FILE_NAME: &str = "codecs.conf";

/// Application directory name used below the platform config directory
pub const APP_DIR_NAME: &str = "vidout";

/// Version string embedded by the build script
pub const VERSION: &str = env!("VIDOUT_BUILD_VERSION");

/// Image file sink defaults
pub mod image_sink {
    /// Frames written to one subdirectory before a new one is started
    pub const DEFAULT_MAX_FILES: u32 = 1000;
    /// Default output directory for per-frame image files
    pub const DEFAULT_OUTDIR: &str = ".";
    /// Default JPEG quality (0-100)
    pub const DEFAULT_JPEG_QUALITY: u8 = 75;
    /// Default PNG compression level (0-9)
    pub const DEFAULT_PNG_COMPRESSION: u8 = 6;
}

/// Stream sink defaults
pub mod stream_sink {
    /// Default output of the md5sum driver
    pub const DEFAULT_MD5_FILE: &str = "md5sums";
    /// Default output of the yuv4mpeg driver
    pub const DEFAULT_Y4M_FILE: &str = "stream.yuv";
}

/// Terminal output tuning
pub mod terminal {
    use std::time::Duration;

    /// How long `check_events` waits for input; zero keeps the render loop non-blocking
    pub const EVENT_POLL_TIMEOUT: Duration = Duration::ZERO;
    /// Equalizer range accepted for brightness and contrast
    pub const EQUALIZER_MIN: i32 = -100;
    pub const EQUALIZER_MAX: i32 = 100;
    /// Character ramp used by the plain (monochrome) renderer, dark to bright
    pub const PLAIN_RAMP: &[u8] = b" .:-=+*#%@";
}

/// Render loop defaults
pub mod render {
    /// Frame rate used when neither the source nor the user gives one
    pub const DEFAULT_FPS: u32 = 25;
    /// Default size of the generated test pattern
    pub const DEFAULT_WIDTH: u32 = 320;
    pub const DEFAULT_HEIGHT: u32 = 240;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_bounds_are_nonzero() {
        assert!(CODECS_MAX_FOURCC > 0);
        assert!(CODECS_MAX_OUTFMT > 0);
        assert!(CODECS_MAX_INFMT > 0);
    }

    #[test]
    fn test_plain_ramp_goes_dark_to_bright() {
        assert_eq!(terminal::PLAIN_RAMP.first(), Some(&b' '));
        assert_eq!(terminal::PLAIN_RAMP.last(), Some(&b'@'));
    }
}
