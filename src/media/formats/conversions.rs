// SPDX-License-Identifier: GPL-3.0-only

//! Pixel conversion to packed RGB
//!
//! Sinks that hand pixels to an RGB consumer (image encoders, the terminal)
//! go through [`to_rgb24`]. Byte order conventions: `RGB24` is R,G,B;
//! `BGR24` is B,G,R; `RGB32`/`BGR32` are the same with a trailing alpha byte.

use super::ImgFmt;
use crate::media::MpImage;

/// Convert one BT.601 YUV sample to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

/// Convert one RGB sample to BT.601 YUV
pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = (b - y) * 0.564 + 128.0;
    let v = (r - y) * 0.713 + 128.0;
    (
        y.round().clamp(0.0, 255.0) as u8,
        u.round().clamp(0.0, 255.0) as u8,
        v.round().clamp(0.0, 255.0) as u8,
    )
}

/// Perceived brightness of an RGB sample
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// Formats [`to_rgb24`] understands
pub fn can_convert(format: ImgFmt) -> bool {
    matches!(
        format,
        ImgFmt::RGB24 | ImgFmt::BGR24 | ImgFmt::RGB32 | ImgFmt::BGR32 | ImgFmt::YUY2 | ImgFmt::UYVY | ImgFmt::YVYU
            | ImgFmt::NV12 | ImgFmt::NV21 | ImgFmt::Y800 | ImgFmt::Y8
    ) || (format.num_planes() == 3 && format.chroma_shift().is_some())
}

/// Convert an image to tightly packed RGB24 (`width * 3` bytes per row).
///
/// Returns `None` for formats without a software conversion.
pub fn to_rgb24(image: &MpImage) -> Option<Vec<u8>> {
    if !can_convert(image.format) {
        return None;
    }
    let (width, height) = (image.width, image.height);
    let mut out = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = sample_rgb(image, x, y);
            out.extend_from_slice(&[r, g, b]);
        }
    }
    Some(out)
}

/// Read the pixel at (`x`, `y`) as RGB. Out-of-range reads give black.
pub fn sample_rgb(image: &MpImage, x: u32, y: u32) -> (u8, u8, u8) {
    if image.width == 0 || image.height == 0 {
        return (0, 0, 0);
    }
    let x = x.min(image.width - 1) as usize;
    let y = y.min(image.height - 1) as usize;
    let format = image.format;

    let at = |plane: usize, idx: usize| -> Option<u8> {
        image.planes.get(plane).and_then(|p| p.data.get(idx).copied())
    };
    let stride = |plane: usize| image.planes.get(plane).map(|p| p.stride).unwrap_or(0);

    match format {
        ImgFmt::RGB24 | ImgFmt::BGR24 | ImgFmt::RGB32 | ImgFmt::BGR32 => {
            let bpp = if format == ImgFmt::RGB24 || format == ImgFmt::BGR24 { 3 } else { 4 };
            let idx = y * stride(0) + x * bpp;
            let (Some(a), Some(b), Some(c)) = (at(0, idx), at(0, idx + 1), at(0, idx + 2)) else {
                return (0, 0, 0);
            };
            if format.is_rgb() { (a, b, c) } else { (c, b, a) }
        }
        ImgFmt::Y800 | ImgFmt::Y8 => {
            let v = at(0, y * stride(0) + x).unwrap_or(0);
            (v, v, v)
        }
        ImgFmt::NV12 | ImgFmt::NV21 => {
            let Some(luma) = at(0, y * stride(0) + x) else {
                return (0, 0, 0);
            };
            let uv_idx = (y / 2) * stride(1) + (x & !1);
            let (Some(first), Some(second)) = (at(1, uv_idx), at(1, uv_idx + 1)) else {
                return (luma, luma, luma);
            };
            let (u, v) = if format == ImgFmt::NV12 { (first, second) } else { (second, first) };
            yuv_to_rgb(luma, u, v)
        }
        ImgFmt::YUY2 | ImgFmt::YVYU | ImgFmt::UYVY => {
            // Two pixels share one chroma pair, 4 bytes per pair
            let base = y * stride(0) + (x & !1) * 2;
            let bytes: Option<Vec<u8>> = (0..4).map(|i| at(0, base + i)).collect();
            let Some(b) = bytes else {
                return (0, 0, 0);
            };
            let odd = x & 1 == 1;
            let (luma, u, v) = match format {
                ImgFmt::YUY2 => (if odd { b[2] } else { b[0] }, b[1], b[3]),
                ImgFmt::YVYU => (if odd { b[2] } else { b[0] }, b[3], b[1]),
                _ => (if odd { b[3] } else { b[1] }, b[0], b[2]),
            };
            yuv_to_rgb(luma, u, v)
        }
        _ => {
            let Some((xs, ys)) = format.chroma_shift() else {
                return (0, 0, 0);
            };
            let Some(luma) = at(0, y * stride(0) + x) else {
                return (0, 0, 0);
            };
            let cx = x >> xs;
            let cy = y >> ys;
            match (at(1, cy * stride(1) + cx), at(2, cy * stride(2) + cx)) {
                (Some(u), Some(v)) => yuv_to_rgb(luma, u, v),
                _ => (luma, luma, luma),
            }
        }
    }
}

/// Convert packed RGB24 into a planar 4:2:0 image (Y, U, V), averaging chroma over 2x2 blocks
pub fn rgb24_to_yuv420p(rgb: &[u8], width: u32, height: u32, format: ImgFmt) -> MpImage {
    let mut image = MpImage::new(format, width, height);
    let (w, h) = (width as usize, height as usize);
    let pixel = |x: usize, y: usize| -> (u8, u8, u8) {
        let idx = (y * w + x) * 3;
        match rgb.get(idx..idx + 3) {
            Some(p) => (p[0], p[1], p[2]),
            None => (0, 0, 0),
        }
    };

    let y_stride = image.planes[0].stride;
    for y in 0..h {
        for x in 0..w {
            let (r, g, b) = pixel(x, y);
            image.planes[0].data[y * y_stride + x] = rgb_to_yuv(r, g, b).0;
        }
    }

    let (cw, ch) = format.plane_size(1, width, height);
    let (u_stride, v_stride) = (image.planes[1].stride, image.planes[2].stride);
    for cy in 0..ch as usize {
        for cx in 0..cw as usize {
            let (mut su, mut sv, mut n) = (0u32, 0u32, 0u32);
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let (px, py) = (cx * 2 + dx, cy * 2 + dy);
                if px < w && py < h {
                    let (r, g, b) = pixel(px, py);
                    let (_, u, v) = rgb_to_yuv(r, g, b);
                    su += u as u32;
                    sv += v as u32;
                    n += 1;
                }
            }
            let n = n.max(1);
            image.planes[1].data[cy * u_stride + cx] = (su / n) as u8;
            image.planes[2].data[cy * v_stride + cx] = (sv / n) as u8;
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv_grey_is_grey() {
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
    }

    #[test]
    fn test_rgb_to_yuv_neutral_chroma() {
        let (y, u, v) = rgb_to_yuv(200, 200, 200);
        assert_eq!(y, 200);
        assert_eq!(u, 128);
        assert_eq!(v, 128);
    }

    #[test]
    fn test_bgr24_is_swapped() {
        let mut image = MpImage::new(ImgFmt::BGR24, 1, 1);
        image.planes[0].data[..3].copy_from_slice(&[10, 20, 30]);
        assert_eq!(sample_rgb(&image, 0, 0), (30, 20, 10));
        assert_eq!(to_rgb24(&image).unwrap(), vec![30, 20, 10]);
    }

    #[test]
    fn test_planar_roundtrip_stays_close() {
        let rgb = vec![255, 0, 0, 255, 0, 0, 255, 0, 0, 255, 0, 0];
        let image = rgb24_to_yuv420p(&rgb, 2, 2, ImgFmt::I420);
        let (r, g, b) = sample_rgb(&image, 1, 1);
        assert!(r > 230, "red channel was {r}");
        assert!(g < 30 && b < 30, "green/blue were {g}/{b}");
    }

    #[test]
    fn test_hwaccel_has_no_conversion() {
        let image = MpImage::new(ImgFmt::VDPAU_H264, 2, 2);
        assert!(to_rgb24(&image).is_none());
    }
}
