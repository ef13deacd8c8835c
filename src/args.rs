// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use std::path::PathBuf;

/// Layout of a raw input frame file.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum InputFormat {
    /// Y plane followed by interleaved V/U samples
    Nv21,
    /// Y plane, then U plane, then V plane
    I420,
}

/// Synthetic frame used when no input file is given.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum Pattern {
    /// Uniform mid-gray, produces no edges
    Flat,
    /// Black left half, white right half
    VerticalEdge,
    /// 32 pixel black and white squares
    Checkerboard,
}

/// Command-line arguments for the edge preview tool.
///
/// Runs the edge detection pipeline over one frame and writes the RGBA
/// overlay as a PNG. Every option can also be set through the environment.
///
/// # Example
///
/// ```bash
/// # Raw NV21 dump from a 1280x720 camera
/// edge-preview --input frame.nv21 --size "1280 720" --output edges.png
///
/// # Synthetic frame, 100 runs, JSON summary
/// PATTERN=checkerboard edge-preview --repeat 100 --stats
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Raw frame file, a synthetic pattern is used when omitted
    #[arg(short, long, env = "INPUT")]
    pub input: Option<PathBuf>,

    /// Layout of the raw frame file
    #[arg(long, env = "INPUT_FORMAT", default_value = "nv21", value_enum)]
    pub input_format: InputFormat,

    /// Frame resolution in pixels (width height)
    #[arg(
        short,
        long,
        env = "FRAME_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub size: Vec<u32>,

    /// Synthetic frame pattern
    #[arg(short, long, env = "PATTERN", default_value = "vertical-edge", value_enum)]
    pub pattern: Pattern,

    /// Output PNG path for the RGBA edge overlay
    #[arg(short, long, env = "OUTPUT", default_value = "edges.png")]
    pub output: PathBuf,

    /// Write the grayscale camera view instead of the edge overlay
    #[arg(long, env = "RAW")]
    pub raw: bool,

    /// Number of times the frame is processed, for timing
    #[arg(short, long, env = "REPEAT", default_value = "1")]
    pub repeat: u32,

    /// Print a JSON summary on stdout
    #[arg(long, env = "STATS")]
    pub stats: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Also send logs to the systemd journal
    #[arg(long, env = "JOURNALD")]
    pub journald: bool,
}
