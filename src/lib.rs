// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # Edge Detector Library
//!
//! This library turns a single camera frame into an edge overlay. It
//! receives an NV21 buffer from a managed-runtime caller, extracts the luma
//! plane, smooths it with a 5×5 Gaussian (σ = 1.5), runs a Canny detector
//! with thresholds 50 / 150 and hands back an RGBA8888 buffer where edges
//! are opaque white and everything else is opaque black.
//!
//! ## Features
//!
//! - **Stateless pipeline**: every frame is processed independently, all
//!   intermediate buffers live only for the duration of one call.
//! - **Fault isolation**: invalid frames and internal faults are logged and
//!   reported as an absent result, never as a panic across the boundary.
//! - **Foreign entry points**: a C ABI (`edge_detector_process_frame`) and,
//!   with the `jni` feature, the Android `NativeProcessor.processEdges`
//!   binding.
//! - **Plane packing**: three-plane YUV 4:2:0 camera images with arbitrary
//!   strides can be packed into NV21 before processing.
//!
//! ## Example
//!
//! ```
//! use edge_detector::process_frame;
//!
//! let (width, height) = (64, 48);
//! let nv21 = vec![128u8; width * height * 3 / 2];
//!
//! let rgba = process_frame(&nv21, width as i32, height as i32).expect("valid frame");
//! assert_eq!(rgba.len(), width * height * 4);
//! assert!(rgba.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
//! ```
//!
//! ## Safety
//!
//! The C and JNI entry points dereference caller-provided pointers. All
//! unsafe code is confined to [`boundary`] and the JNI module.

#![deny(improper_ctypes_definitions)]

#[cfg(feature = "jni")]
pub mod android;
pub mod boundary;
pub mod edges;
pub mod error;
pub mod frame;
pub mod yuv;

pub use boundary::{process_frame, try_process_frame};
pub use edges::detect_edges;
pub use error::EdgeError;
pub use frame::{Nv21Frame, OutputFrame};
