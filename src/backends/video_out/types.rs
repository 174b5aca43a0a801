// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for video output drivers

use super::subopt::SubOptError;
use crate::constants::render::DEFAULT_FPS;
use crate::media::ImgFmt;
use crate::media::MpImage;
use std::path::PathBuf;

/// Result type for driver operations
pub type VoResult<T> = Result<T, VoError>;

/// Error types for video output operations
#[derive(Debug, thiserror::Error)]
pub enum VoError {
    /// No driver is registered under this name
    #[error("Unknown video output driver: {0}")]
    UnknownDriver(String),
    /// Every candidate in the driver list failed to initialize
    #[error("No usable video output driver")]
    NoUsableDriver,
    /// An operation was attempted before `init_best`
    #[error("No video output driver is active")]
    NoActiveDriver,
    /// Sub-option string rejected by `preinit`
    #[error("{driver}: {source}")]
    SubOption {
        driver: &'static str,
        source: SubOptError,
    },
    /// The driver cannot run in this environment
    #[error("{driver} not available: {reason}")]
    NotAvailable { driver: &'static str, reason: String },
    /// The driver was asked to display a format it did not accept
    #[error("Format not supported: {0}")]
    FormatNotSupported(ImgFmt),
    /// Drawing before `config`
    #[error("Driver is not configured")]
    NotConfigured,
    /// The driver does not implement this entry point
    #[error("{driver} does not support {operation}")]
    Unsupported {
        driver: &'static str,
        operation: &'static str,
    },
    /// Geometry or plane data does not match the configuration
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    /// File system errors with the path involved
    #[error("I/O error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Other I/O errors (terminal, streams)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Image encoder failure
    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl VoError {
    /// Wrap an I/O error with the path it happened on
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VoError::File {
            path: path.into(),
            source,
        }
    }
}

/// Static driver description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoInfo {
    /// Human-readable name
    pub name: &'static str,
    /// Name used to select the driver
    pub short_name: &'static str,
    pub author: &'static str,
    pub comment: &'static str,
    /// Tried when the driver list asks for automatic selection
    pub autoprobe: bool,
}

bitflags::bitflags! {
    /// Capabilities reported by `QueryFormat`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VfCaps: u32 {
        const CSP_SUPPORTED = 0x1;
        const CSP_SUPPORTED_BY_HW = 0x2;
        const OSD = 0x4;
        const SPU = 0x8;
        const HWSCALE_UP = 0x10;
        const HWSCALE_DOWN = 0x20;
        const SWSCALE = 0x40;
        const FLIP = 0x80;
        const TIMER = 0x100;
        const ACCEPT_STRIDE = 0x400;
        const POSTPROC = 0x800;
        const EOSD = 0x2000;
    }
}

bitflags::bitflags! {
    /// Flags passed to `config`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConfigFlags: u32 {
        const FULLSCREEN = 0x1;
        const MODESWITCHING = 0x2;
        const SWSCALE = 0x4;
        const FLIPPING = 0x8;
    }
}

/// Frame rate as a fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    /// Create a frame rate; a zero denominator is treated as 1
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Time between two frames, `None` for a zero rate
    pub fn frame_duration(&self) -> Option<std::time::Duration> {
        (self.num > 0).then(|| std::time::Duration::from_nanos(1_000_000_000 * u64::from(self.denom) / u64::from(self.num)))
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}", self.num)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self::from_int(DEFAULT_FPS)
    }
}

/// Arguments of `config`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoConfig {
    /// Source size
    pub width: u32,
    pub height: u32,
    /// Display size (after aspect correction)
    pub d_width: u32,
    pub d_height: u32,
    pub flags: ConfigFlags,
    pub title: String,
    pub format: ImgFmt,
    pub fps: Framerate,
}

impl VoConfig {
    /// A configuration whose display size equals the source size
    pub fn new(format: ImgFmt, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            d_width: width,
            d_height: height,
            flags: ConfigFlags::empty(),
            title: String::new(),
            format,
            fps: Framerate::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_fps(mut self, fps: Framerate) -> Self {
        self.fps = fps;
        self
    }
}

/// Requests sent through `control`
#[derive(Debug, Clone, Copy)]
pub enum Control<'a> {
    /// Which capabilities the driver has for a format
    QueryFormat(ImgFmt),
    /// Take a whole image; `False`/`NotImpl` makes the caller fall back to slices or frames
    DrawImage(&'a MpImage),
    Reset,
    Pause,
    Resume,
    Fullscreen,
    Ontop,
    Border,
    GetEqualizer(&'a str),
    SetEqualizer(&'a str, i32),
    UpdateScreenInfo,
}

impl Control<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Control::QueryFormat(_) => "query_format",
            Control::DrawImage(_) => "draw_image",
            Control::Reset => "reset",
            Control::Pause => "pause",
            Control::Resume => "resume",
            Control::Fullscreen => "fullscreen",
            Control::Ontop => "ontop",
            Control::Border => "border",
            Control::GetEqualizer(_) => "get_equalizer",
            Control::SetEqualizer(..) => "set_equalizer",
            Control::UpdateScreenInfo => "update_screeninfo",
        }
    }
}

/// Replies to `control`; errors travel as `Err(VoError)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    True,
    False,
    NotImpl,
    Caps(VfCaps),
    Value(i32),
}

impl ControlReply {
    /// Capabilities from a `QueryFormat` reply, empty for anything else
    pub fn caps(self) -> VfCaps {
        match self {
            ControlReply::Caps(caps) => caps,
            _ => VfCaps::empty(),
        }
    }
}

/// Input and window events reported by `check_events`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoEvent {
    Quit,
    TogglePause,
    Resize { width: u16, height: u16 },
    Key(char),
}

/// On-screen display content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsdState {
    pub message: Option<String>,
    /// Progress bar position in `0.0..=1.0`
    pub progress: Option<f32>,
}

impl OsdState {
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.progress.is_none()
    }

    /// One-line rendering: message, then a percentage
    pub fn status_line(&self) -> String {
        match (&self.message, self.progress) {
            (Some(msg), Some(p)) => format!("{msg} [{:>3.0}%]", p.clamp(0.0, 1.0) * 100.0),
            (Some(msg), None) => msg.clone(),
            (None, Some(p)) => format!("[{:>3.0}%]", p.clamp(0.0, 1.0) * 100.0),
            (None, None) => String::new(),
        }
    }
}
