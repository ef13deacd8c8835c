// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use thiserror::Error;

/// Failure kinds of a single frame.
///
/// Callers across the foreign boundary never see these values; they only
/// observe an absent result. The variant and message end up in the log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeError {
    /// Rejected before any processing: empty buffer, non-positive
    /// dimensions, or planes too short for their declared strides.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Raised while converting, blurring or detecting edges.
    #[error("processing fault: {0}")]
    ProcessingFault(String),
}

pub type Result<T> = std::result::Result<T, EdgeError>;
