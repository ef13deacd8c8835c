// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Packing of three-plane YUV 4:2:0 camera images into NV21.
//!
//! Camera stacks such as Android's `YUV_420_888` hand out the Y, U and V
//! planes separately, each with its own row stride and pixel stride. The
//! chroma planes are frequently views into one interleaved buffer (pixel
//! stride 2), but nothing guarantees it, so samples are gathered one at a
//! time unless the plane is tightly packed.

use crate::{
    error::{EdgeError, Result},
    frame::{frame_size, I420, NV21},
};
use tracing::debug;

/// One plane of a multi-plane YUV image.
#[derive(Copy, Clone, Debug)]
pub struct Plane<'a> {
    /// Plane bytes, starting at the first sample
    pub data: &'a [u8],
    /// Distance in bytes between the starts of two rows
    pub row_stride: usize,
    /// Distance in bytes between two samples of a row
    pub pixel_stride: usize,
}

impl<'a> Plane<'a> {
    /// A tightly packed plane, one byte per sample and no row padding.
    pub fn packed(data: &'a [u8], width: usize) -> Self {
        Self {
            data,
            row_stride: width,
            pixel_stride: 1,
        }
    }

    fn is_packed(&self, width: usize) -> bool {
        self.pixel_stride == 1 && self.row_stride == width
    }

    fn check(&self, name: &str, width: usize, height: usize) -> Result<()> {
        if self.pixel_stride == 0 || self.row_stride == 0 {
            return Err(EdgeError::InvalidInput(format!(
                "{name} plane has zero stride"
            )));
        }
        // the last row may end right after its last sample
        let required = (width - 1)
            .checked_mul(self.pixel_stride)
            .and_then(|n| n.checked_add(1))
            .zip((height - 1).checked_mul(self.row_stride))
            .and_then(|(row, rows)| rows.checked_add(row))
            .ok_or_else(|| EdgeError::InvalidInput(format!("{name} plane size overflows")))?;
        if self.data.len() < required {
            return Err(EdgeError::InvalidInput(format!(
                "{name} plane needs {required} bytes for {width}x{height}, got {}",
                self.data.len()
            )));
        }
        Ok(())
    }

    #[inline]
    fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.row_stride + x * self.pixel_stride]
    }
}

/// A YUV 4:2:0 image split into three planes.
#[derive(Copy, Clone, Debug)]
pub struct Yuv420Planes<'a> {
    pub y: Plane<'a>,
    pub u: Plane<'a>,
    pub v: Plane<'a>,
    pub width: u32,
    pub height: u32,
}

impl Yuv420Planes<'_> {
    /// Packs the planes into a contiguous NV21 buffer.
    ///
    /// The luma plane is copied row by row, then every chroma sample is
    /// written as a V, U pair.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::InvalidInput`] if a dimension is zero or odd, or
    /// if a plane is too short for its strides.
    pub fn to_nv21(&self) -> Result<Vec<u8>> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(EdgeError::InvalidInput(format!(
                "YUV 4:2:0 requires even non-zero dimensions, got {width}x{height}"
            )));
        }
        let size = frame_size(width, height, NV21).ok_or_else(|| {
            EdgeError::InvalidInput(format!("frame size {width}x{height} overflows"))
        })?;
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w / 2, h / 2);
        self.y.check("Y", w, h)?;
        self.u.check("U", cw, ch)?;
        self.v.check("V", cw, ch)?;

        let mut nv21 = Vec::with_capacity(size);
        if self.y.is_packed(w) {
            nv21.extend_from_slice(&self.y.data[..w * h]);
        } else if self.y.pixel_stride == 1 {
            for row in 0..h {
                let start = row * self.y.row_stride;
                nv21.extend_from_slice(&self.y.data[start..start + w]);
            }
        } else {
            debug!("gathering strided luma plane {:?}", self.y.pixel_stride);
            for row in 0..h {
                nv21.extend((0..w).map(|col| self.y.sample(col, row)));
            }
        }

        for row in 0..ch {
            for col in 0..cw {
                nv21.push(self.v.sample(col, row));
                nv21.push(self.u.sample(col, row));
            }
        }

        debug_assert_eq!(nv21.len(), size);
        Ok(nv21)
    }
}

/// Repacks a contiguous I420 buffer (Y, U, V planes) as NV21.
pub fn pack_i420(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = frame_size(width, height, I420).ok_or_else(|| {
        EdgeError::InvalidInput(format!("frame size {width}x{height} overflows"))
    })?;
    if buffer.len() != expected {
        return Err(EdgeError::InvalidInput(format!(
            "I420 {width}x{height} expects {expected} bytes, got {}",
            buffer.len()
        )));
    }
    let (w, h) = (width as usize, height as usize);
    let luma = w * h;
    let chroma = (w / 2) * (h / 2);
    let (y, rest) = buffer.split_at(luma);
    let (u, v) = rest.split_at(chroma.min(rest.len()));

    Yuv420Planes {
        y: Plane::packed(y, w),
        u: Plane::packed(u, w / 2),
        v: Plane::packed(v, w / 2),
        width,
        height,
    }
    .to_nv21()
}
