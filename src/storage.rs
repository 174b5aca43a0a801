// SPDX-License-Identifier: GPL-3.0-only

//! Output directories and per-frame file names for the image sinks

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Create `dir` if needed and make sure it is a writable directory
///
/// # Returns
/// * `Ok(true)` - The directory was created
/// * `Ok(false)` - It already existed and is usable
/// * `Err` - It cannot be created, is not a directory, or is read-only
pub fn ensure_output_dir(dir: &Path) -> io::Result<bool> {
    match std::fs::create_dir(dir) {
        Ok(()) => {
            info!(path = %dir.display(), "Directory created");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let meta = std::fs::metadata(dir)?;
            if !meta.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} exists but is not a directory", dir.display()),
                ));
            }
            if meta.permissions().readonly() {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("{} exists but is not writable", dir.display()),
                ));
            }
            if dir != Path::new(".") {
                debug!(path = %dir.display(), "Directory exists and is writable");
            }
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Hands out `%08d.ext` file names, optionally spread over numbered subdirectories
///
/// Frame numbers start at 1. With a subdirectory prefix, frames go to
/// `{outdir}/{prefix}%08d/` and a new subdirectory is started every
/// `max_files` frames.
#[derive(Debug, Clone)]
pub struct FrameFileNamer {
    outdir: PathBuf,
    subdir_prefix: Option<String>,
    max_files: u32,
    extension: &'static str,
    frame_num: u32,
    in_current_dir: u32,
    subdir_num: u32,
    current_dir: PathBuf,
}

impl FrameFileNamer {
    pub fn new(outdir: impl Into<PathBuf>, subdir_prefix: Option<String>, max_files: u32, extension: &'static str) -> Self {
        let outdir = outdir.into();
        Self {
            current_dir: outdir.clone(),
            outdir,
            subdir_prefix,
            max_files: max_files.max(1),
            extension,
            frame_num: 0,
            in_current_dir: 0,
            subdir_num: 0,
        }
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Frames named so far
    pub fn frame_count(&self) -> u32 {
        self.frame_num
    }

    /// Path for the next frame, creating a new subdirectory when one is due
    pub fn next_path(&mut self) -> io::Result<PathBuf> {
        if self.in_current_dir == self.max_files {
            self.in_current_dir = 0;
        }
        if self.in_current_dir == 0
            && let Some(prefix) = &self.subdir_prefix
        {
            self.subdir_num += 1;
            let dir = self.outdir.join(format!("{prefix}{:08}", self.subdir_num));
            ensure_output_dir(&dir)?;
            self.current_dir = dir;
        }
        self.frame_num += 1;
        self.in_current_dir += 1;
        Ok(self
            .current_dir
            .join(format!("{:08}.{}", self.frame_num, self.extension)))
    }
}
