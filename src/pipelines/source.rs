// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources feeding the render loop

use crate::backends::video_out::Framerate;
use crate::media::formats::conversions::rgb24_to_yuv420p;
use crate::media::{ImgFmt, MpImage};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::info;

/// Something that produces decoded pictures
pub trait FrameSource {
    /// Formats this source can produce, preferred first
    fn formats(&self) -> Vec<ImgFmt>;

    /// Picture size in pixels
    fn size(&self) -> (u32, u32);

    /// Nominal frame rate, if the source knows it
    fn fps(&self) -> Option<Framerate> {
        None
    }

    /// Frames remaining, if known
    fn len_hint(&self) -> Option<u64> {
        None
    }

    /// Next picture in `format` (one of [`FrameSource::formats`]); `Ok(None)` at the end
    fn next_frame(&mut self, format: ImgFmt) -> io::Result<Option<MpImage>>;
}

/// SMPTE-style color bars with a moving white bar, endless unless limited
#[derive(Debug, Clone)]
pub struct TestPattern {
    width: u32,
    height: u32,
    frame: u64,
    limit: Option<u64>,
}

/// 75% color bars, left to right
const BARS: [(u8, u8, u8); 8] = [
    (191, 191, 191),
    (191, 191, 0),
    (0, 191, 191),
    (0, 191, 0),
    (191, 0, 191),
    (191, 0, 0),
    (0, 0, 191),
    (16, 16, 16),
];

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: 0,
            limit: None,
        }
    }

    /// Stop after `frames` pictures
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    fn render_rgb(&self) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let bar_width = w.div_ceil(BARS.len()).max(1);
        let moving_row = if h == 0 { 0 } else { (self.frame as usize * 2) % h };
        let mut rgb = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                let (r, g, b) = if y.abs_diff(moving_row) < 2 {
                    (235, 235, 235)
                } else {
                    BARS[(x / bar_width).min(BARS.len() - 1)]
                };
                rgb.extend_from_slice(&[r, g, b]);
            }
        }
        rgb
    }
}

impl FrameSource for TestPattern {
    fn formats(&self) -> Vec<ImgFmt> {
        vec![ImgFmt::YV12, ImgFmt::I420, ImgFmt::RGB24]
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn len_hint(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.frame))
    }

    fn next_frame(&mut self, format: ImgFmt) -> io::Result<Option<MpImage>> {
        if self.limit.is_some_and(|limit| self.frame >= limit) {
            return Ok(None);
        }
        let rgb = self.render_rgb();
        self.frame += 1;
        let image = if format.is_yuv420p() {
            rgb24_to_yuv420p(&rgb, self.width, self.height, format)
        } else if format == ImgFmt::RGB24 {
            MpImage::from_packed_planes(format, self.width, self.height, vec![rgb])
                .ok_or_else(|| io::Error::other("test pattern size mismatch"))?
        } else {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("test pattern cannot produce {format}"),
            ));
        };
        Ok(Some(image))
    }
}

/// Headerless file of tightly packed frames in one format
pub struct RawFileSource {
    reader: Box<dyn Read>,
    format: ImgFmt,
    width: u32,
    height: u32,
    fps: Option<Framerate>,
}

impl RawFileSource {
    pub fn open(path: &Path, format: ImgFmt, width: u32, height: u32) -> io::Result<Self> {
        let file = File::open(path)?;
        info!(path = %path.display(), format = %format, width, height, "Reading raw frames");
        Ok(Self::from_reader(BufReader::new(file), format, width, height))
    }

    pub fn from_reader(reader: impl Read + 'static, format: ImgFmt, width: u32, height: u32) -> Self {
        Self {
            reader: Box::new(reader),
            format,
            width,
            height,
            fps: None,
        }
    }

    pub fn with_fps(mut self, fps: Framerate) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Bytes per plane of one frame
    fn plane_sizes(&self) -> Vec<usize> {
        (0..self.format.num_planes())
            .map(|i| {
                let (_, h) = self.format.plane_size(i, self.width, self.height);
                self.format.plane_row_bytes(i, self.width) * h as usize
            })
            .collect()
    }
}

impl std::fmt::Debug for RawFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFileSource")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl FrameSource for RawFileSource {
    fn formats(&self) -> Vec<ImgFmt> {
        vec![self.format]
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fps(&self) -> Option<Framerate> {
        self.fps
    }

    fn next_frame(&mut self, format: ImgFmt) -> io::Result<Option<MpImage>> {
        if format != self.format {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("raw file holds {}, not {format}", self.format),
            ));
        }
        let mut planes = Vec::new();
        for size in self.plane_sizes() {
            let mut data = vec![0; size];
            match self.reader.read_exact(&mut data) {
                Ok(()) => planes.push(data),
                // A truncated trailing frame ends the stream
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e),
            }
        }
        if self.format.is_vu_order() {
            planes.swap(1, 2);
        }
        MpImage::from_packed_planes(self.format, self.width, self.height, planes)
            .map(Some)
            .ok_or_else(|| io::Error::other("raw frame size mismatch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_limit() {
        let mut pattern = TestPattern::new(16, 8).with_limit(2);
        assert_eq!(pattern.len_hint(), Some(2));
        assert!(pattern.next_frame(ImgFmt::YV12).unwrap().is_some());
        assert!(pattern.next_frame(ImgFmt::RGB24).unwrap().is_some());
        assert!(pattern.next_frame(ImgFmt::YV12).unwrap().is_none());
        assert_eq!(pattern.len_hint(), Some(0));
    }

    #[test]
    fn test_pattern_bars() {
        let mut pattern = TestPattern::new(16, 8);
        let image = pattern.next_frame(ImgFmt::RGB24).unwrap().unwrap();
        let rows: Vec<&[u8]> = image.rows(0).collect();
        // Row 4 is away from the moving bar on the first frame
        assert_eq!(&rows[4][..3], &[191, 191, 191]);
        assert_eq!(&rows[4][45..48], &[16, 16, 16]);
    }

    #[test]
    fn test_pattern_rejects_packed_yuv() {
        let mut pattern = TestPattern::new(4, 4);
        assert!(pattern.next_frame(ImgFmt::YUY2).is_err());
    }

    #[test]
    fn test_raw_file_frames() {
        let frame_len = 4 * 2 + 2 + 2;
        let mut data: Vec<u8> = (0..frame_len as u8).collect();
        data.extend(std::iter::repeat_n(9u8, frame_len));
        data.extend_from_slice(&[1, 2, 3]);
        let mut source = RawFileSource::from_reader(io::Cursor::new(data), ImgFmt::I420, 4, 2);

        let first = source.next_frame(ImgFmt::I420).unwrap().unwrap();
        assert_eq!(first.planes[0].data, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(first.planes[1].data, vec![8, 9]);
        assert_eq!(first.planes[2].data, vec![10, 11]);
        assert!(source.next_frame(ImgFmt::I420).unwrap().is_some());
        assert!(source.next_frame(ImgFmt::I420).unwrap().is_none());
        assert!(source.next_frame(ImgFmt::YV12).is_err());
    }

    #[test]
    fn test_raw_yv12_chroma_order() {
        let mut data = vec![0x80; 8];
        data.extend_from_slice(&[0xCC, 0xCC]);
        data.extend_from_slice(&[0x11, 0x11]);
        let mut source = RawFileSource::from_reader(io::Cursor::new(data), ImgFmt::YV12, 4, 2);

        let image = source.next_frame(ImgFmt::YV12).unwrap().unwrap();
        assert_eq!(image.planes[1].data, vec![0x11, 0x11]);
        assert_eq!(image.planes[2].data, vec![0xCC, 0xCC]);
    }
}
