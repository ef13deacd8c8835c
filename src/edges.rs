// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Fixed NV21 to RGBA edge overlay pipeline.
//!
//! Each frame runs through the same stages with the same parameters:
//!
//! 1. grayscale extraction from the NV21 luma plane
//! 2. separable 5×5 Gaussian blur, σ = 1.5, reflect-101 borders
//! 3. Canny: 3×3 Sobel (replicated borders), L1 magnitude, four-direction
//!    non-maximum suppression and 8-connected hysteresis between the low
//!    and high thresholds
//! 4. expansion of the binary edge map to opaque RGBA
//!
//! Every call allocates its own intermediate buffers and keeps nothing
//! between frames.

use crate::{
    error::{EdgeError, Result},
    frame::{Nv21Frame, OutputFrame},
};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    time::Instant,
};
use tracing::debug;

/// Side length of the square Gaussian kernel.
pub const BLUR_KERNEL_SIZE: usize = 5;

/// Standard deviation of the Gaussian kernel.
pub const BLUR_SIGMA: f32 = 1.5;

/// Gradient magnitude above which a local maximum is kept as a weak edge.
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;

/// Gradient magnitude above which a local maximum seeds an edge.
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

/// Value written for edge pixels in the binary map.
pub const EDGE: u8 = 255;

const TAN_22_5_DEG: f32 = 0.414_213_56;

// hysteresis states
const NONE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Runs the pipeline over a raw NV21 buffer and returns the RGBA bytes.
///
/// Any fault, including a panic inside one of the stages, is reported as
/// [`EdgeError::ProcessingFault`]; no partial output is ever returned.
pub fn detect_edges(buffer: &[u8], width: i32, height: i32) -> Result<Vec<u8>> {
    let width = u32::try_from(width)
        .map_err(|_| EdgeError::ProcessingFault(format!("negative width {width}")))?;
    let height = u32::try_from(height)
        .map_err(|_| EdgeError::ProcessingFault(format!("negative height {height}")))?;
    let frame = Nv21Frame::new(buffer, width, height)?;

    panic::catch_unwind(AssertUnwindSafe(|| detect_frame_edges(&frame)))
        .map_err(|payload| EdgeError::ProcessingFault(panic_message(payload.as_ref())))?
        .map(OutputFrame::into_vec)
}

/// Runs the pipeline over a validated frame.
pub fn detect_frame_edges(frame: &Nv21Frame) -> Result<OutputFrame> {
    let start = Instant::now();
    let gray = grayscale(frame)?;
    let blurred = gaussian_blur(&gray);
    let edges = canny(&blurred, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
    let rgba = expand_rgba(&edges);
    debug!(
        "edges {} -> {}x{} rgba in {:?}",
        frame,
        rgba.width(),
        rgba.height(),
        start.elapsed()
    );

    Ok(OutputFrame::new(rgba.into_raw(), frame.width(), frame.height()))
}

/// Extracts the luma plane of an NV21 frame as a grayscale image.
pub fn grayscale(frame: &Nv21Frame) -> Result<GrayImage> {
    GrayImage::from_raw(frame.width(), frame.height(), frame.luma().to_vec()).ok_or_else(|| {
        EdgeError::ProcessingFault(format!("luma plane does not fit {frame}"))
    })
}

/// Normalized 1-D Gaussian kernel of [`BLUR_KERNEL_SIZE`] taps.
pub fn gaussian_kernel(sigma: f32) -> [f32; BLUR_KERNEL_SIZE] {
    let center = (BLUR_KERNEL_SIZE / 2) as f32;
    let mut kernel = [0.0f32; BLUR_KERNEL_SIZE];
    for (i, k) in kernel.iter_mut().enumerate() {
        let d = i as f32 - center;
        *k = (-(d * d) / (2.0 * sigma * sigma)).exp();
    }
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Mirrors `i` into `0..len` without repeating the border sample
/// (`gfedcb|abcdefgh|gfedcba`).
#[inline]
fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Separable 5×5 Gaussian blur with σ = [`BLUR_SIGMA`].
pub fn gaussian_blur(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    let kernel = gaussian_kernel(BLUR_SIGMA);
    let radius = (BLUR_KERNEL_SIZE / 2) as isize;
    let src = gray.as_raw();

    let mut horizontal = vec![0.0f32; w * h];
    for (y, out) in horizontal.chunks_exact_mut(w.max(1)).take(h).enumerate() {
        let row = &src[y * w..(y + 1) * w];
        for (x, acc) in out.iter_mut().enumerate() {
            *acc = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * row[reflect_101(x as isize + k as isize - radius, w)] as f32)
                .sum();
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let acc: f32 = kernel
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                weight * horizontal[reflect_101(y as isize + k as isize - radius, h) * w + x]
            })
            .sum();
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

/// Sobel derivatives and their L1 magnitude.
#[derive(Clone, Debug)]
pub struct Gradients {
    pub width: usize,
    pub height: usize,
    pub gx: Vec<i32>,
    pub gy: Vec<i32>,
    pub mag: Vec<i32>,
}

impl Gradients {
    /// Magnitude at `(x, y)`, zero outside the image.
    #[inline]
    fn mag_at(&self, x: isize, y: isize) -> i32 {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return 0;
        }
        self.mag[y as usize * self.width + x as usize]
    }
}

/// 3×3 Sobel with replicated borders.
pub fn sobel(image: &GrayImage) -> Gradients {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let src = image.as_raw();
    let mut gx = vec![0i32; w * h];
    let mut gy = vec![0i32; w * h];
    let mut mag = vec![0i32; w * h];

    for y in 0..h {
        let rows = [
            &src[y.saturating_sub(1) * w..][..w],
            &src[y * w..][..w],
            &src[(y + 1).min(h - 1) * w..][..w],
        ];
        for x in 0..w {
            let l = x.saturating_sub(1);
            let r = (x + 1).min(w - 1);
            let p = |row: usize, col: usize| rows[row][col] as i32;

            let dx = (p(0, r) + 2 * p(1, r) + p(2, r)) - (p(0, l) + 2 * p(1, l) + p(2, l));
            let dy = (p(2, l) + 2 * p(2, x) + p(2, r)) - (p(0, l) + 2 * p(0, x) + p(0, r));
            let i = y * w + x;
            gx[i] = dx;
            gy[i] = dy;
            mag[i] = dx.abs() + dy.abs();
        }
    }

    Gradients {
        width: w,
        height: h,
        gx,
        gy,
        mag,
    }
}

/// Whether `(x, y)` is a maximum along its quantized gradient direction.
///
/// Ties are broken towards the earlier pixel so a symmetric ridge two pixels
/// wide still yields a one pixel line.
#[inline]
fn is_local_max(grad: &Gradients, x: usize, y: usize) -> bool {
    let i = y * grad.width + x;
    let m = grad.mag[i];
    let (gx, gy) = (grad.gx[i], grad.gy[i]);
    let (x, y) = (x as isize, y as isize);
    let ax = gx.abs() as f32;
    let ay = gy.abs() as f32;

    let tg22 = ax * TAN_22_5_DEG;
    if ay < tg22 {
        return m > grad.mag_at(x - 1, y) && m >= grad.mag_at(x + 1, y);
    }
    let tg67 = tg22 + 2.0 * ax;
    if ay > tg67 {
        return m > grad.mag_at(x, y - 1) && m >= grad.mag_at(x, y + 1);
    }
    let s = if (gx < 0) != (gy < 0) { -1 } else { 1 };
    m > grad.mag_at(x - s, y - 1) && m > grad.mag_at(x + s, y + 1)
}

/// Canny edge detector over an already smoothed image.
///
/// Returns a binary map where edge pixels are [`EDGE`] and everything else
/// is zero.
pub fn canny(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let grad = sobel(image);
    let (w, h) = (grad.width, grad.height);

    let mut state = vec![NONE; w * h];
    let mut stack = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let m = grad.mag[i] as f32;
            if m <= low || !is_local_max(&grad, x, y) {
                continue;
            }
            if m > high {
                state[i] = STRONG;
                stack.push(i);
            } else {
                state[i] = WEAK;
            }
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = (i % w, i / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let j = ny * w + nx;
                if state[j] == WEAK {
                    state[j] = STRONG;
                    stack.push(j);
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let i = y as usize * w + x as usize;
        Luma([if state[i] == STRONG { EDGE } else { 0 }])
    })
}

/// Replicates the edge value into R, G and B with an opaque alpha.
pub fn expand_rgba(edges: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(edges.width(), edges.height(), |x, y| {
        let v = edges.get_pixel(x, y).0[0];
        Rgba([v, v, v, 255])
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic: {msg}")
    } else {
        "panic with unknown payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)]))
    }

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(BLUR_SIGMA);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(k[0], k[4]);
        assert_eq!(k[1], k[3]);
        assert!(k[2] > k[1] && k[1] > k[0]);
        // exp(-1 / 4.5) relative to the center tap
        assert!((k[1] / k[2] - 0.800_737).abs() < 1e-4);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 8), 1);
        assert_eq!(reflect_101(-2, 8), 2);
        assert_eq!(reflect_101(8, 8), 6);
        assert_eq!(reflect_101(9, 8), 5);
        assert_eq!(reflect_101(-2, 2), 0);
        assert_eq!(reflect_101(3, 2), 1);
        assert_eq!(reflect_101(-2, 1), 0);
    }

    #[test]
    fn test_blur_keeps_flat_field() {
        let img = gray(16, 8, |_, _| 128);
        let blurred = gaussian_blur(&img);
        assert!(blurred.pixels().all(|p| p.0[0] == 128));
    }

    #[test]
    fn test_blur_spreads_impulse() {
        let img = gray(9, 9, |x, y| if x == 4 && y == 4 { 255 } else { 0 });
        let blurred = gaussian_blur(&img);
        let center = blurred.get_pixel(4, 4).0[0];
        assert!(center > 0 && center < 255);
        assert_eq!(blurred.get_pixel(3, 4), blurred.get_pixel(5, 4));
        assert_eq!(blurred.get_pixel(4, 3), blurred.get_pixel(4, 5));
        // outside the 5×5 support
        assert_eq!(blurred.get_pixel(1, 4).0[0], 0);
    }

    #[test]
    fn test_sobel_directions() {
        let vertical = sobel(&gray(8, 8, |x, _| if x < 4 { 0 } else { 100 }));
        assert_eq!(vertical.gx[3 * 8 + 3], 400);
        assert_eq!(vertical.gy[3 * 8 + 3], 0);
        assert_eq!(vertical.mag[3 * 8], 0);

        let horizontal = sobel(&gray(8, 8, |_, y| if y < 4 { 100 } else { 0 }));
        assert_eq!(horizontal.gy[4 * 8 + 2], -400);
        assert_eq!(horizontal.gx[4 * 8 + 2], 0);
    }

    #[test]
    fn test_canny_single_line_on_step() {
        let img = gaussian_blur(&gray(32, 16, |x, _| if x < 16 { 0 } else { 255 }));
        let edges = canny(&img, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
        for y in 0..16 {
            let cols: Vec<u32> = (0..32).filter(|&x| edges.get_pixel(x, y).0[0] == EDGE).collect();
            assert_eq!(cols.len(), 1, "row {y}: {cols:?}");
            assert!((14..=17).contains(&cols[0]));
        }
    }

    #[test]
    fn test_canny_rejects_weak_gradients() {
        // a step of 8 gives |gx| of at most 32 after Sobel
        let img = gaussian_blur(&gray(32, 16, |x, _| if x < 16 { 100 } else { 108 }));
        let edges = canny(&img, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
        assert!(edges.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_hysteresis_follows_weak_pixels() {
        // magnitude ramps along the edge: only the high end alone clears the
        // high threshold, the rest is reached through connectivity
        let img = gray(16, 24, |x, y| if x < 8 { 0 } else { 20 + 2 * y as u8 });
        let edges = canny(&img, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
        let grad = sobel(&img);
        let weak_rows = (1..23)
            .filter(|&y| {
                let m = grad.mag[y * 16 + 8] as f32;
                m > CANNY_LOW_THRESHOLD && m <= CANNY_HIGH_THRESHOLD
            })
            .count();
        assert!(weak_rows > 0);
        for y in 1..23 {
            assert_eq!(edges.get_pixel(8, y).0[0], EDGE, "row {y}");
            assert_eq!(edges.get_pixel(7, y).0[0], 0, "row {y}");
        }
    }

    #[test]
    fn test_expand_rgba() {
        let edges = gray(2, 1, |x, _| if x == 0 { EDGE } else { 0 });
        let rgba = expand_rgba(&edges);
        assert_eq!(rgba.into_raw(), vec![255, 255, 255, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_detect_edges_reports_faults() {
        let data = vec![0u8; 8 * 8 * 3 / 2];
        assert!(detect_edges(&data, 8, 8).is_ok());
        assert!(matches!(
            detect_edges(&data, -8, 8),
            Err(EdgeError::ProcessingFault(_))
        ));
        assert!(matches!(
            detect_edges(&data, 8, 10),
            Err(EdgeError::ProcessingFault(_))
        ));
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "panic: boom");
    }
}
