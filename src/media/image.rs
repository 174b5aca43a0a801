// SPDX-License-Identifier: GPL-3.0-only

//! Owned raster images handed to video outputs

use crate::media::formats::ImgFmt;

bitflags::bitflags! {
    /// Layout flags derived from an image's format
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImageFlags: u32 {
        /// Pixels are split over several planes
        const PLANAR = 1 << 0;
        /// Samples are YUV rather than RGB
        const YUV = 1 << 1;
    }
}

/// One plane of an image
#[derive(Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    /// Bytes between the starts of two consecutive rows
    pub stride: usize,
}

impl std::fmt::Debug for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Plane({} bytes, stride {})", self.data.len(), self.stride)
    }
}

/// A decoded picture.
///
/// Planar YUV images always expose their planes in Y, U, V order, whatever
/// the in-memory order of the format's FourCC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpImage {
    pub format: ImgFmt,
    pub width: u32,
    pub height: u32,
    pub planes: Vec<Plane>,
}

/// Row alignment used for freshly allocated planes
const STRIDE_ALIGN: usize = 16;

impl MpImage {
    /// Allocate a zeroed image with aligned strides
    pub fn new(format: ImgFmt, width: u32, height: u32) -> Self {
        let planes = (0..format.num_planes())
            .map(|i| {
                let (_, h) = format.plane_size(i, width, height);
                let stride = format.plane_row_bytes(i, width).next_multiple_of(STRIDE_ALIGN);
                Plane {
                    data: vec![0; stride * h as usize],
                    stride,
                }
            })
            .collect();
        Self {
            format,
            width,
            height,
            planes,
        }
    }

    /// Wrap tightly packed planes (stride equals the visible row size).
    ///
    /// Returns `None` when the number of planes or their sizes do not match the format.
    pub fn from_packed_planes(format: ImgFmt, width: u32, height: u32, planes: Vec<Vec<u8>>) -> Option<Self> {
        if planes.len() != format.num_planes() {
            return None;
        }
        let planes = planes
            .into_iter()
            .enumerate()
            .map(|(i, data)| {
                let (_, h) = format.plane_size(i, width, height);
                let stride = format.plane_row_bytes(i, width);
                (data.len() >= stride * h as usize).then_some(Plane { data, stride })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            format,
            width,
            height,
            planes,
        })
    }

    pub fn flags(&self) -> ImageFlags {
        let mut flags = ImageFlags::empty();
        if self.format.is_planar() {
            flags |= ImageFlags::PLANAR;
        }
        if self.format.is_yuv() {
            flags |= ImageFlags::YUV;
        }
        flags
    }

    /// Borrow every plane's bytes
    pub fn plane_slices(&self) -> Vec<&[u8]> {
        self.planes.iter().map(|p| p.data.as_slice()).collect()
    }

    pub fn strides(&self) -> Vec<usize> {
        self.planes.iter().map(|p| p.stride).collect()
    }

    /// Visible rows of plane `plane`, without stride padding
    pub fn rows(&self, plane: usize) -> impl Iterator<Item = &[u8]> {
        let (_, h) = self.format.plane_size(plane, self.width, self.height);
        let row_bytes = self.format.plane_row_bytes(plane, self.width);
        let stride = self.planes.get(plane).map(|p| p.stride).unwrap_or(0);
        let data: &[u8] = self.planes.get(plane).map(|p| p.data.as_slice()).unwrap_or(&[]);
        (0..h as usize).filter_map(move |row| data.get(row * stride..row * stride + row_bytes))
    }

    /// Copy a slice (sub-rectangle of rows) into this image at (`x`, `y`).
    ///
    /// `src` holds one buffer per plane starting at the slice's first row;
    /// `w`, `h`, `x`, `y` are in luma pixels and scaled down for chroma planes.
    pub fn copy_slice(
        &mut self,
        src: &[&[u8]],
        strides: &[usize],
        w: u32,
        h: u32,
        x: u32,
        y: u32,
    ) -> Result<(), SliceError> {
        if x.saturating_add(w) > self.width || y.saturating_add(h) > self.height {
            return Err(SliceError::OutOfBounds);
        }
        let format = self.format;
        let shift = format.chroma_shift();
        for (plane_idx, plane) in self.planes.iter_mut().enumerate() {
            let (Some(src_plane), Some(&src_stride)) = (src.get(plane_idx), strides.get(plane_idx)) else {
                return Err(SliceError::MissingPlane(plane_idx));
            };
            let (px, py, pw, ph) = match (plane_idx, shift) {
                (0, _) | (_, None) => (x, y, w, h),
                (_, Some((_, ys))) if format.num_planes() == 2 => (x, y >> ys, w, h.div_ceil(1 << ys)),
                (_, Some((xs, ys))) => (x >> xs, y >> ys, w.div_ceil(1 << xs), h.div_ceil(1 << ys)),
            };
            let row_bytes = format.plane_row_bytes(plane_idx, pw);
            let col_offset = format.plane_row_bytes(plane_idx, px);
            for row in 0..ph as usize {
                let src_start = row * src_stride;
                let Some(src_row) = src_plane.get(src_start..src_start + row_bytes) else {
                    return Err(SliceError::ShortPlane(plane_idx));
                };
                let dst_start = (py as usize + row) * plane.stride + col_offset;
                let Some(dst_row) = plane.data.get_mut(dst_start..dst_start + row_bytes) else {
                    return Err(SliceError::OutOfBounds);
                };
                dst_row.copy_from_slice(src_row);
            }
        }
        Ok(())
    }
}

/// Reasons a slice cannot be copied into an image
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SliceError {
    #[error("slice lies outside the image")]
    OutOfBounds,
    #[error("slice is missing plane {0}")]
    MissingPlane(usize),
    #[error("slice plane {0} is shorter than its stride and height require")]
    ShortPlane(usize),
}
