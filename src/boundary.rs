// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Foreign call boundary.
//!
//! Nothing raised by the pipeline crosses into the caller: failures are
//! logged and collapse into an absent result (`None` in Rust, a null buffer
//! over the C ABI, `null` over JNI).

use crate::{
    edges::{self, panic_message},
    error::{EdgeError, Result},
    frame::OutputFrame,
};
use std::{
    mem::ManuallyDrop,
    panic::{self, AssertUnwindSafe},
    ptr, slice,
};
use tracing::error;

/// Validates the call arguments and runs the pipeline.
///
/// # Errors
///
/// - [`EdgeError::InvalidInput`] for an empty buffer or a non-positive
///   dimension
/// - [`EdgeError::ProcessingFault`] for everything the pipeline reports
pub fn try_process_frame(buffer: &[u8], width: i32, height: i32) -> Result<OutputFrame> {
    if buffer.is_empty() {
        return Err(EdgeError::InvalidInput("empty image buffer".to_string()));
    }
    if width <= 0 || height <= 0 {
        return Err(EdgeError::InvalidInput(format!(
            "invalid dimensions {width}x{height}"
        )));
    }

    let rgba = edges::detect_edges(buffer, width, height)?;
    Ok(OutputFrame::new(rgba, width as u32, height as u32))
}

/// Processes one NV21 frame into an RGBA edge overlay.
///
/// Returns `None` when the frame is rejected or processing fails; the reason
/// is logged through `tracing`. Never panics.
pub fn process_frame(buffer: &[u8], width: i32, height: i32) -> Option<Vec<u8>> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        try_process_frame(buffer, width, height)
    }))
    .unwrap_or_else(|payload| Err(EdgeError::ProcessingFault(panic_message(payload.as_ref()))));

    match result {
        Ok(frame) => Some(frame.into_vec()),
        Err(err) => {
            error!(width, height, len = buffer.len(), "frame skipped: {err}");
            None
        }
    }
}

/// Owned byte buffer handed across the C ABI.
///
/// A null `data` pointer is the failure signal. Buffers returned by
/// [`edge_detector_process_frame`] belong to the caller until they are
/// passed back to [`edge_detector_free_buffer`].
#[repr(C)]
#[derive(Debug)]
pub struct EdgeBuffer {
    data: *mut u8,
    len: usize,
    cap: usize,
}

impl EdgeBuffer {
    pub fn null() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
            cap: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        if self.data.is_null() {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.data, self.len) }
    }
}

impl Default for EdgeBuffer {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Vec<u8>> for EdgeBuffer {
    fn from(data: Vec<u8>) -> Self {
        let mut data = ManuallyDrop::new(data);
        Self {
            data: data.as_mut_ptr(),
            len: data.len(),
            cap: data.capacity(),
        }
    }
}

impl Drop for EdgeBuffer {
    fn drop(&mut self) {
        if self.data.is_null() {
            return;
        }
        unsafe {
            drop(Vec::from_raw_parts(self.data, self.len, self.cap));
        }
    }
}

/// Runs the edge pipeline over an NV21 frame.
///
/// Returns a null [`EdgeBuffer`] on any failure.
///
/// # Safety
///
/// - `data` must be null or point to `len` readable bytes that stay valid
///   and unmodified for the duration of the call.
/// - The returned buffer must be released with
///   [`edge_detector_free_buffer`] and not with the caller's allocator.
#[no_mangle]
pub unsafe extern "C" fn edge_detector_process_frame(
    data: *const u8,
    len: usize,
    width: i32,
    height: i32,
) -> EdgeBuffer {
    if data.is_null() || len == 0 {
        error!(width, height, "frame skipped: null image buffer");
        return EdgeBuffer::null();
    }
    let buffer = slice::from_raw_parts(data, len);
    match process_frame(buffer, width, height) {
        Some(rgba) => rgba.into(),
        None => EdgeBuffer::null(),
    }
}

/// Releases a buffer returned by [`edge_detector_process_frame`].
///
/// Passing a null buffer is a no-op.
#[no_mangle]
pub extern "C" fn edge_detector_free_buffer(buf: EdgeBuffer) {
    drop(buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_arguments() {
        let data = vec![0u8; 4 * 4 * 3 / 2];
        assert!(matches!(
            try_process_frame(&[], 4, 4),
            Err(EdgeError::InvalidInput(_))
        ));
        assert!(matches!(
            try_process_frame(&data, 0, 4),
            Err(EdgeError::InvalidInput(_))
        ));
        assert!(matches!(
            try_process_frame(&data, 4, -4),
            Err(EdgeError::InvalidInput(_))
        ));
        assert!(matches!(
            try_process_frame(&data, 4, 6),
            Err(EdgeError::ProcessingFault(_))
        ));
        assert_eq!(process_frame(&data, 4, 6), None);
    }

    #[test]
    fn test_output_sized_to_frame() {
        let data = vec![128u8; 8 * 6 * 3 / 2];
        let frame = try_process_frame(&data, 8, 6).unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));
        assert_eq!(frame.size(), 8 * 6 * 4);
    }

    #[test]
    fn test_edge_buffer_ownership() {
        let buf = EdgeBuffer::from(vec![1u8, 2, 3]);
        assert!(!buf.is_null());
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
        edge_detector_free_buffer(buf);

        let null = EdgeBuffer::default();
        assert!(null.is_null());
        assert!(null.as_slice().is_empty());
        edge_detector_free_buffer(null);
    }

    #[test]
    fn test_c_abi_null_input() {
        let buf = unsafe { edge_detector_process_frame(ptr::null(), 24, 4, 4) };
        assert!(buf.is_null());
    }
}
