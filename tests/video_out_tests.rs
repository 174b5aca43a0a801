// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the video output manager and the file drivers

use std::cell::RefCell;
use std::path::Path;
use vidout::backends::video_out::{
    Control, ControlReply, DriverEntry, VfCaps, VideoOutManager, VideoOutput, VoConfig, VoError, VoEvent, VoInfo,
    VoResult,
};
use vidout::pipelines::{RenderOptions, TestPattern, render};
use vidout::{ImgFmt, MpImage};

thread_local! {
    static CALLS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(call: impl Into<String>) {
    CALLS.with(|c| c.borrow_mut().push(call.into()));
}

fn take_calls() -> Vec<String> {
    CALLS.with(|c| std::mem::take(&mut *c.borrow_mut()))
}

/// Test driver; `accept_draw_image` decides whether `DrawImage` is taken
struct Probe {
    info: &'static VoInfo,
    fail_preinit: bool,
    accept_draw_image: bool,
}

impl VideoOutput for Probe {
    fn info(&self) -> &'static VoInfo {
        self.info
    }
    fn preinit(&mut self, subopts: &str) -> VoResult<()> {
        record(format!("{} preinit {subopts}", self.info.short_name));
        if self.fail_preinit {
            return Err(VoError::NotAvailable {
                driver: self.info.short_name,
                reason: "test".into(),
            });
        }
        Ok(())
    }
    fn config(&mut self, _cfg: &VoConfig) -> VoResult<()> {
        Ok(())
    }
    fn uninit(&mut self) {
        record(format!("{} uninit", self.info.short_name));
    }
    fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
        match req {
            Control::QueryFormat(_) => Ok(ControlReply::Caps(VfCaps::CSP_SUPPORTED)),
            Control::DrawImage(_) if self.accept_draw_image => {
                record("draw_image");
                Ok(ControlReply::True)
            }
            _ => Ok(ControlReply::NotImpl),
        }
    }
    fn draw_frame(&mut self, planes: &[&[u8]]) -> VoResult<()> {
        record(format!("draw_frame {}", planes.len()));
        Ok(())
    }
    fn draw_slice(&mut self, planes: &[&[u8]], _strides: &[usize], w: u32, h: u32, x: u32, y: u32) -> VoResult<()> {
        record(format!("draw_slice {} {w}x{h}+{x}+{y}", planes.len()));
        Ok(())
    }
    fn flip_page(&mut self) -> VoResult<()> {
        Ok(())
    }
    fn check_events(&mut self) -> VoResult<Vec<VoEvent>> {
        Ok(Vec::new())
    }
}

static BROKEN: VoInfo = VoInfo {
    name: "broken",
    short_name: "broken",
    author: "tests",
    comment: "",
    autoprobe: true,
};
static SLICES: VoInfo = VoInfo {
    name: "slices",
    short_name: "slices",
    author: "tests",
    comment: "",
    autoprobe: true,
};
static DIRECT: VoInfo = VoInfo {
    name: "direct",
    short_name: "direct",
    author: "tests",
    comment: "",
    autoprobe: false,
};

fn test_registry() -> Vec<DriverEntry> {
    vec![
        DriverEntry {
            info: &BROKEN,
            create: || {
                Box::new(Probe {
                    info: &BROKEN,
                    fail_preinit: true,
                    accept_draw_image: false,
                })
            },
        },
        DriverEntry {
            info: &SLICES,
            create: || {
                Box::new(Probe {
                    info: &SLICES,
                    fail_preinit: false,
                    accept_draw_image: false,
                })
            },
        },
        DriverEntry {
            info: &DIRECT,
            create: || {
                Box::new(Probe {
                    info: &DIRECT,
                    fail_preinit: false,
                    accept_draw_image: true,
                })
            },
        },
    ]
}

#[test]
fn test_failing_driver_falls_through() {
    take_calls();
    let mut vo = VideoOutManager::with_registry(test_registry());
    let info = vo.init_best("x11,broken:fast,direct:a=1").unwrap();
    assert_eq!(info.short_name, "direct");
    assert_eq!(take_calls(), vec!["broken preinit fast", "direct preinit a=1"]);
}

#[test]
fn test_trailing_comma_adds_autoprobe() {
    take_calls();
    let mut vo = VideoOutManager::with_registry(test_registry());
    let info = vo.init_best("broken,").unwrap();
    // The explicit entry fails, then autoprobe tries broken again and lands on slices
    assert_eq!(info.short_name, "slices");
    assert_eq!(
        take_calls(),
        vec!["broken preinit ", "broken preinit ", "slices preinit "]
    );

    // Without the trailing comma nothing else is tried
    assert!(matches!(vo.init_best("broken"), Err(VoError::NoUsableDriver)));
    // An empty list means autoprobe only; "direct" is not an autoprobe driver
    assert_eq!(vo.init_best("").unwrap().short_name, "slices");
}

#[test]
fn test_draw_image_routing() {
    let mut vo = VideoOutManager::with_registry(test_registry());
    vo.init_best("slices").unwrap();
    take_calls();

    vo.draw_image(&MpImage::new(ImgFmt::YV12, 16, 8)).unwrap();
    vo.draw_image(&MpImage::new(ImgFmt::RGB24, 16, 8)).unwrap();
    assert_eq!(take_calls(), vec!["draw_slice 3 16x8+0+0", "draw_frame 1"]);

    vo.init_best("direct").unwrap();
    take_calls();
    vo.draw_image(&MpImage::new(ImgFmt::YV12, 16, 8)).unwrap();
    assert_eq!(take_calls(), vec!["draw_image"]);
}

#[test]
fn test_drop_uninits_active_driver() {
    take_calls();
    {
        let mut vo = VideoOutManager::with_registry(test_registry());
        vo.init_best("direct").unwrap();
        vo.config(&VoConfig::new(ImgFmt::YV12, 4, 4)).unwrap();
        vo.config(&VoConfig::new(ImgFmt::YV12, 8, 8)).unwrap();
        assert_eq!(vo.config_count(), 2);
    }
    assert_eq!(take_calls().last().map(String::as_str), Some("direct uninit"));
}

#[test]
fn test_no_active_driver() {
    let mut vo = VideoOutManager::with_registry(test_registry());
    assert!(matches!(vo.flip_page(), Err(VoError::NoActiveDriver)));
}

#[test]
fn test_unknown_names_are_skipped_in_builtin_registry() {
    let mut vo = VideoOutManager::new();
    assert_eq!(vo.init_best("x11,xv,null").unwrap().short_name, "null");
    assert!(matches!(vo.init_best("x11"), Err(VoError::NoUsableDriver)));
}

fn gray_yv12(width: u32, height: u32) -> MpImage {
    let mut image = MpImage::new(ImgFmt::YV12, width, height);
    for (i, plane) in image.planes.iter_mut().enumerate() {
        plane.data.fill(10 * (i as u8 + 1));
    }
    image
}

#[test]
fn test_pnm_pgmyuv_through_manager() {
    let tmp = tempfile::tempdir().unwrap();
    let mut vo = VideoOutManager::new();
    vo.init_best(&format!("pnm:pgmyuv:outdir={}", tmp.path().display())).unwrap();
    assert!(vo.query_format(ImgFmt::YV12).unwrap().contains(VfCaps::CSP_SUPPORTED));
    assert!(vo.query_format(ImgFmt::RGB24).unwrap().is_empty());

    vo.config(&VoConfig::new(ImgFmt::YV12, 4, 2)).unwrap();
    vo.draw_image(&gray_yv12(4, 2)).unwrap();
    vo.flip_page().unwrap();

    let bytes = std::fs::read(tmp.path().join("00000001.pgmyuv")).unwrap();
    let mut expected = b"P5\n4 3\n255\n".to_vec();
    expected.extend_from_slice(&[10; 8]);
    expected.extend_from_slice(&[20, 20, 30, 30]);
    assert_eq!(bytes, expected);
}

#[test]
fn test_pnm_ascii_ppm() {
    let tmp = tempfile::tempdir().unwrap();
    let mut vo = VideoOutManager::new();
    vo.init_best(&format!("pnm:ppm:ascii:outdir={}", tmp.path().display())).unwrap();
    vo.config(&VoConfig::new(ImgFmt::RGB24, 2, 1)).unwrap();
    let image = MpImage::from_packed_planes(ImgFmt::RGB24, 2, 1, vec![vec![1, 2, 3, 4, 5, 255]]).unwrap();
    vo.draw_image(&image).unwrap();

    let text = std::fs::read_to_string(tmp.path().join("00000001.ppm")).unwrap();
    assert_eq!(text, "P3\n2 1\n255\n001 002 003 004 005 255 \n");
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_md5sum_same_for_slices_and_whole_images() {
    let tmp = tempfile::tempdir().unwrap();
    let whole = tmp.path().join("whole");
    let sliced = tmp.path().join("sliced");

    for (path, slices) in [(&whole, 1), (&sliced, 4)] {
        let mut vo = VideoOutManager::new();
        vo.init_best(&format!("md5sum:outfile={}", path.display())).unwrap();
        let mut source = TestPattern::new(32, 24).with_limit(3);
        let opts = RenderOptions {
            slices,
            ..RenderOptions::default()
        };
        let stats = render::run(&mut vo, &mut source, &opts).unwrap();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.format, ImgFmt::YV12);
    }

    let whole = read_lines(&whole);
    assert_eq!(whole.len(), 3);
    assert!(whole[2].ends_with("  frame00000003"));
    assert_eq!(whole, read_lines(&sliced));
}

#[test]
fn test_yuv4mpeg_stream_size() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("out.y4m");
    let mut vo = VideoOutManager::new();
    vo.init_best(&format!("yuv4mpeg:file={}", path.display())).unwrap();
    let mut source = TestPattern::new(16, 8).with_limit(2);
    let opts = RenderOptions {
        slices: 2,
        ..RenderOptions::default()
    };
    render::run(&mut vo, &mut source, &opts).unwrap();
    vo.uninit();

    let bytes = std::fs::read(&path).unwrap();
    let header = "YUV4MPEG2 W16 H8 F25:1 Ip A1:1\n";
    assert!(bytes.starts_with(header.as_bytes()));
    let frame = "FRAME\n".len() + 16 * 8 * 3 / 2;
    assert_eq!(bytes.len(), header.len() + 2 * frame);
}

#[test]
fn test_png_frames_decode() {
    let tmp = tempfile::tempdir().unwrap();
    let mut vo = VideoOutManager::new();
    vo.init_best(&format!("png:z=1:outdir={}", tmp.path().display())).unwrap();
    let mut source = TestPattern::new(16, 8).with_limit(2);
    let stats = render::run(&mut vo, &mut source, &RenderOptions::default()).unwrap();
    assert_eq!(stats.format, ImgFmt::RGB24);

    let decoded = image::open(tmp.path().join("00000002.png")).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (16, 8));
    // First bar is 75% white, away from the moving line
    assert_eq!(decoded.get_pixel(0, 6).0, [191, 191, 191]);
}
