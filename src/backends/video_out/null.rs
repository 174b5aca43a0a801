// SPDX-License-Identifier: GPL-3.0-only

//! Output driver that discards every frame

use super::subopt::SubOptions;
use super::types::*;
use super::VideoOutput;
use tracing::debug;

pub static INFO: VoInfo = VoInfo {
    name: "Null video output",
    short_name: "null",
    author: "vidout",
    comment: "Discards frames; useful for benchmarks",
    autoprobe: true,
};

/// Accepts everything a software decoder can produce and draws nothing
#[derive(Debug, Default)]
pub struct NullOutput {
    configured: Option<VoConfig>,
    frames: u64,
}

impl NullOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages flipped since the last `config`
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl VideoOutput for NullOutput {
    fn info(&self) -> &'static VoInfo {
        &INFO
    }

    fn preinit(&mut self, subopts: &str) -> VoResult<()> {
        SubOptions::parse(subopts, &[]).map_err(|source| VoError::SubOption {
            driver: INFO.short_name,
            source,
        })?;
        Ok(())
    }

    fn config(&mut self, cfg: &VoConfig) -> VoResult<()> {
        self.configured = Some(cfg.clone());
        self.frames = 0;
        Ok(())
    }

    fn uninit(&mut self) {
        if self.configured.take().is_some() {
            debug!(frames = self.frames, "Null output closed");
        }
    }

    fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
        match req {
            Control::QueryFormat(format) if !format.is_hwaccel() => Ok(ControlReply::Caps(VfCaps::CSP_SUPPORTED)),
            Control::QueryFormat(_) => Ok(ControlReply::Caps(VfCaps::empty())),
            _ => Ok(ControlReply::NotImpl),
        }
    }

    fn draw_frame(&mut self, _planes: &[&[u8]]) -> VoResult<()> {
        Ok(())
    }

    fn draw_slice(&mut self, _planes: &[&[u8]], _strides: &[usize], _w: u32, _h: u32, _x: u32, _y: u32) -> VoResult<()> {
        Ok(())
    }

    fn flip_page(&mut self) -> VoResult<()> {
        self.frames += 1;
        Ok(())
    }
}
