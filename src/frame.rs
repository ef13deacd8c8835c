// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{EdgeError, Result};
use core::fmt;

/// Four character pixel format code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// NV21 4:2:0 YUV semi-planar format (Android camera default, V before U)
pub const NV21: FourCC = FourCC(*b"NV21");

/// I420 4:2:0 YUV planar format (Y plane, then U plane, then V plane)
pub const I420: FourCC = FourCC(*b"I420");

/// 8-bit single channel grayscale
pub const GREY: FourCC = FourCC(*b"GREY");

/// RGBA 32-bit pixel format (8 bits per channel, with alpha)
pub const RGBA: FourCC = FourCC(*b"RGBA");

/// Number of bytes a `width` x `height` frame occupies in `format`.
///
/// Returns `None` for unknown formats and when the size does not fit in
/// `usize`. The 4:2:0 formats carry `width * height / 2` chroma bytes after
/// the luma plane, which is exact for even dimensions.
pub fn frame_size(width: u32, height: u32, format: FourCC) -> Option<usize> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    match format {
        NV21 | I420 => pixels.checked_add(pixels / 2),
        GREY => Some(pixels),
        RGBA => pixels.checked_mul(4),
        _ => None,
    }
}

/// Borrowed NV21 camera frame.
///
/// The frame is a read-only view over the caller's buffer and is only valid
/// for the duration of one call.
#[derive(Copy, Clone, Debug)]
pub struct Nv21Frame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> Nv21Frame<'a> {
    /// Wraps `data` as an NV21 frame after checking its shape.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::ProcessingFault`] if:
    /// - either dimension is zero or odd (4:2:0 needs whole chroma samples)
    /// - the declared size overflows
    /// - `data.len()` differs from `width * height * 3 / 2`
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EdgeError::ProcessingFault(format!(
                "empty frame {width}x{height}"
            )));
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(EdgeError::ProcessingFault(format!(
                "NV21 requires even dimensions, got {width}x{height}"
            )));
        }
        let expected = frame_size(width, height, NV21).ok_or_else(|| {
            EdgeError::ProcessingFault(format!("frame size {width}x{height} overflows"))
        })?;
        if data.len() != expected {
            return Err(EdgeError::ProcessingFault(format!(
                "NV21 {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> FourCC {
        NV21
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Full resolution luma plane, `width * height` bytes.
    pub fn luma(&self) -> &'a [u8] {
        &self.data[..self.width as usize * self.height as usize]
    }

    /// Interleaved V/U plane at half resolution in both directions.
    pub fn chroma(&self) -> &'a [u8] {
        &self.data[self.width as usize * self.height as usize..]
    }
}

impl fmt::Display for Nv21Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} {} bytes",
            self.width,
            self.height,
            NV21,
            self.data.len()
        )
    }
}

/// RGBA8888 frame produced by the edge pipeline.
///
/// Pixels are stored row-major, four bytes each, with alpha always 255.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl OutputFrame {
    pub(crate) fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(Some(data.len()), frame_size(width, height, RGBA));
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> FourCC {
        RGBA
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterates over the `[r, g, b, a]` quadruples in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(4)
    }

    /// Number of pixels marked as edges.
    pub fn edge_count(&self) -> usize {
        self.pixels().filter(|px| px[0] != 0).count()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Display for OutputFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} {} bytes",
            self.width,
            self.height,
            RGBA,
            self.data.len()
        )
    }
}
