// SPDX-License-Identifier: GPL-3.0-only

//! Single-threaded render loop
//!
//! Negotiates a format with the active driver, configures it, then per
//! frame: draw (whole image or horizontal slices), OSD, flip, events.

use super::source::FrameSource;
use crate::backends::video_out::{
    Control, Framerate, OsdState, VfCaps, VideoOutManager, VoConfig, VoError, VoEvent,
};
use crate::errors::AppResult;
use crate::media::{ImageFlags, ImgFmt, MpImage};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sleep used while paused
const PAUSE_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Stop after this many frames
    pub max_frames: Option<u64>,
    /// Deliver planar pictures in this many horizontal bands; 1 hands over whole images
    pub slices: u32,
    /// Frame rate when the source has none
    pub fps: Framerate,
    /// Sleep between frames to keep the frame rate
    pub pace: bool,
    pub title: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_frames: None,
            slices: 1,
            fps: Framerate::default(),
            pace: false,
            title: String::from("vidout"),
        }
    }
}

/// What happened during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub format: ImgFmt,
    pub frames: u64,
    /// The user asked to quit before the source ran out
    pub quit: bool,
}

/// Pick the first source format the driver accepts
pub fn negotiate_format(vo: &mut VideoOutManager, candidates: &[ImgFmt]) -> AppResult<ImgFmt> {
    for &format in candidates {
        let caps = vo.query_format(format)?;
        debug!(format = %format, caps = ?caps, "Format query");
        if caps.contains(VfCaps::CSP_SUPPORTED) {
            return Ok(format);
        }
    }
    let first = candidates.first().copied().unwrap_or(ImgFmt::YV12);
    Err(VoError::FormatNotSupported(first).into())
}

/// Run `source` through the active driver of `vo` until it ends or the user quits
pub fn run(vo: &mut VideoOutManager, source: &mut dyn FrameSource, opts: &RenderOptions) -> AppResult<RenderStats> {
    let format = negotiate_format(vo, &source.formats())?;
    let (width, height) = source.size();
    let fps = source.fps().unwrap_or(opts.fps);
    vo.config(
        &VoConfig::new(format, width, height)
            .with_title(opts.title.clone())
            .with_fps(fps),
    )?;

    let total = opts.max_frames.or(source.len_hint());
    let frame_time = fps.frame_duration();
    let mut stats = RenderStats {
        format,
        frames: 0,
        quit: false,
    };
    let mut paused = false;
    let mut deadline = Instant::now();

    info!(format = %format, width, height, fps = %fps, "Render loop started");

    loop {
        if opts.max_frames.is_some_and(|max| stats.frames >= max) {
            break;
        }

        for event in vo.check_events()? {
            match event {
                VoEvent::Quit => stats.quit = true,
                VoEvent::TogglePause => {
                    paused = !paused;
                    vo.control(if paused { Control::Pause } else { Control::Resume })?;
                    vo.draw_osd(&OsdState {
                        message: paused.then(|| "Paused".to_string()),
                        progress: None,
                    });
                }
                VoEvent::Resize { width, height } => debug!(width, height, "Output resized"),
                VoEvent::Key(key) => debug!(%key, "Key ignored"),
            }
        }
        if stats.quit {
            break;
        }
        if paused {
            std::thread::sleep(PAUSE_POLL);
            continue;
        }

        let Some(image) = source.next_frame(format)? else {
            break;
        };
        draw(vo, &image, opts.slices)?;
        stats.frames += 1;

        vo.draw_osd(&OsdState {
            message: Some(format!("{} {}", opts.title, stats.frames)),
            progress: total.filter(|t| *t > 0).map(|t| stats.frames as f32 / t as f32),
        });
        vo.flip_page()?;

        if opts.pace
            && let Some(frame_time) = frame_time
        {
            deadline += frame_time;
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }
    }

    info!(frames = stats.frames, quit = stats.quit, "Render loop finished");
    Ok(stats)
}

/// Hand one picture to the driver, whole or as `slices` bands
fn draw(vo: &mut VideoOutManager, image: &MpImage, slices: u32) -> AppResult<()> {
    if slices <= 1 || !image.flags().contains(ImageFlags::PLANAR) {
        vo.draw_image(image)?;
        return Ok(());
    }
    for (y, h) in bands(image, slices) {
        let mut planes = Vec::with_capacity(image.planes.len());
        for (i, plane) in image.planes.iter().enumerate() {
            let row = if i == 0 { y } else { y >> chroma_rows_shift(image.format) };
            let start = (row as usize * plane.stride).min(plane.data.len());
            planes.push(&plane.data[start..]);
        }
        vo.draw_slice(&planes, &image.strides(), image.width, h, 0, y)?;
    }
    Ok(())
}

fn chroma_rows_shift(format: ImgFmt) -> u32 {
    format.chroma_shift().map_or(0, |(_, ys)| ys)
}

/// `(y, height)` bands covering the image, aligned to whole chroma rows
fn bands(image: &MpImage, slices: u32) -> Vec<(u32, u32)> {
    let align = 1 << chroma_rows_shift(image.format);
    let band = image.height.div_ceil(slices).next_multiple_of(align).max(align);
    (0..image.height)
        .step_by(band as usize)
        .map(|y| (y, band.min(image.height - y)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::video_out::{ControlReply, DriverEntry, VideoOutput, VoInfo, VoResult};
    use crate::pipelines::source::TestPattern;
    use std::cell::RefCell;
    use std::rc::Rc;

    static SCRIPTED_INFO: VoInfo = VoInfo {
        name: "scripted",
        short_name: "scripted",
        author: "tests",
        comment: "",
        autoprobe: true,
    };

    thread_local! {
        static LOG: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    }

    /// Accepts only I420 and quits on the third event poll
    #[derive(Default)]
    struct Scripted {
        polls: u32,
    }

    fn log(entry: impl Into<String>) {
        LOG.with(|l| l.borrow_mut().push(entry.into()));
    }

    impl VideoOutput for Scripted {
        fn info(&self) -> &'static VoInfo {
            &SCRIPTED_INFO
        }
        fn preinit(&mut self, _subopts: &str) -> VoResult<()> {
            Ok(())
        }
        fn config(&mut self, cfg: &VoConfig) -> VoResult<()> {
            log(format!("config {}", cfg.format));
            Ok(())
        }
        fn uninit(&mut self) {}
        fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
            match req {
                Control::QueryFormat(f) if f == ImgFmt::I420 => Ok(ControlReply::Caps(VfCaps::CSP_SUPPORTED)),
                Control::QueryFormat(_) => Ok(ControlReply::Caps(VfCaps::empty())),
                other => {
                    log(other.name());
                    Ok(ControlReply::NotImpl)
                }
            }
        }
        fn draw_frame(&mut self, _planes: &[&[u8]]) -> VoResult<()> {
            log("frame");
            Ok(())
        }
        fn draw_slice(&mut self, _p: &[&[u8]], _s: &[usize], _w: u32, h: u32, _x: u32, y: u32) -> VoResult<()> {
            log(format!("slice {y}+{h}"));
            Ok(())
        }
        fn flip_page(&mut self) -> VoResult<()> {
            log("flip");
            Ok(())
        }
        fn check_events(&mut self) -> VoResult<Vec<VoEvent>> {
            self.polls += 1;
            Ok(if self.polls == 3 { vec![VoEvent::Quit] } else { Vec::new() })
        }
    }

    fn scripted_manager() -> VideoOutManager {
        let mut vo = VideoOutManager::with_registry(vec![DriverEntry {
            info: &SCRIPTED_INFO,
            create: || Box::new(Scripted::default()),
        }]);
        vo.init_best("").unwrap();
        vo
    }

    #[test]
    fn test_negotiates_and_quits() {
        LOG.with(|l| l.borrow_mut().clear());
        let mut vo = scripted_manager();
        let mut source = TestPattern::new(8, 8);
        let stats = run(&mut vo, &mut source, &RenderOptions::default()).unwrap();
        assert_eq!(stats.format, ImgFmt::I420);
        assert_eq!(stats.frames, 2);
        assert!(stats.quit);

        let log = LOG.with(|l| l.borrow().clone());
        assert_eq!(log[0], "config I420");
        // DrawImage is not taken, so each picture arrives as one full slice
        assert_eq!(&log[1..], &["draw_image", "slice 0+8", "flip", "draw_image", "slice 0+8", "flip"]);
    }

    #[test]
    fn test_slices_cover_image() {
        LOG.with(|l| l.borrow_mut().clear());
        let mut vo = scripted_manager();
        let mut source = TestPattern::new(8, 10);
        let opts = RenderOptions {
            max_frames: Some(1),
            slices: 3,
            ..RenderOptions::default()
        };
        run(&mut vo, &mut source, &opts).unwrap();
        let log = LOG.with(|l| l.borrow().clone());
        assert_eq!(&log[1..], &["slice 0+4", "slice 4+4", "slice 8+2", "flip"]);
    }

    #[test]
    fn test_no_common_format() {
        let mut vo = scripted_manager();
        assert!(negotiate_format(&mut vo, &[ImgFmt::RGB24]).is_err());
    }
}
