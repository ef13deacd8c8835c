// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use anyhow::{Context, Result};
use args::{Args, InputFormat, Pattern};
use clap::Parser;
use edge_detector::{
    edges,
    frame::{frame_size, Nv21Frame, NV21},
    try_process_frame,
    yuv::pack_i420,
};
use serde_json::json;
use std::{
    fs,
    path::Path,
    time::{Duration, Instant},
};
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, Layer};

/// Rolling frame rate over the last few runs.
struct FpsCounter {
    history: Vec<f64>,
    index: usize,
    filled: usize,
}

impl FpsCounter {
    fn new(len: usize) -> Self {
        Self {
            history: vec![0.0; len],
            index: 0,
            filled: 0,
        }
    }

    fn update(&mut self, elapsed: Duration) -> f64 {
        self.history[self.index] = 1.0 / elapsed.as_secs_f64().max(1e-9);
        self.index = (self.index + 1) % self.history.len();
        self.filled = (self.filled + 1).min(self.history.len());

        self.history[..self.filled].iter().sum::<f64>() / self.filled as f64
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_filter(level));

    #[cfg(unix)]
    let registry = registry.with(if args.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_filter(level)),
            Err(err) => {
                eprintln!("journald unavailable: {err}");
                None
            }
        }
    } else {
        None
    });
    #[cfg(not(unix))]
    if args.journald {
        eprintln!("journald logging is only available on unix");
    }

    tracing::subscriber::set_global_default(registry)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn synthesize(pattern: Pattern, width: u32, height: u32) -> Vec<u8> {
    let luma = (0..height).flat_map(|y| {
        (0..width).map(move |x| match pattern {
            Pattern::Flat => 128,
            Pattern::VerticalEdge if x < width / 2 => 0,
            Pattern::VerticalEdge => 255,
            Pattern::Checkerboard if (x / 32 + y / 32) % 2 == 0 => 0,
            Pattern::Checkerboard => 255,
        })
    });
    let pixels = width as usize * height as usize;
    luma.chain(std::iter::repeat(128).take(pixels / 2)).collect()
}

fn load_frame(args: &Args, width: u32, height: u32) -> Result<Vec<u8>> {
    let Some(path) = &args.input else {
        debug!("using synthetic {:?} frame", args.pattern);
        return Ok(synthesize(args.pattern, width, height));
    };

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match args.input_format {
        InputFormat::Nv21 => Ok(raw),
        InputFormat::I420 => Ok(pack_i420(&raw, width, height)?),
    }
}

/// Writes the luma plane as a grayscale PNG, the unprocessed camera view.
fn save_raw(nv21: &[u8], width: u32, height: u32, path: &Path) -> Result<()> {
    let frame = Nv21Frame::new(nv21, width, height)?;
    edges::grayscale(&frame)?
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("saved raw {} view to {}", frame, path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let (width, height) = (args.size[0], args.size[1]);
    let nv21 = load_frame(&args, width, height)?;
    if Some(nv21.len()) != frame_size(width, height, NV21) {
        warn!(
            "{} bytes do not match a {}x{} {} frame",
            nv21.len(),
            width,
            height,
            NV21
        );
    }

    if args.raw {
        return save_raw(&nv21, width, height, &args.output);
    }

    let repeat = args.repeat.max(1);
    let mut fps_counter = FpsCounter::new(30);
    let mut fps = 0.0;
    let mut total = Duration::ZERO;
    let mut output = None;
    for _ in 0..repeat {
        let now = Instant::now();
        let frame = try_process_frame(&nv21, i32::try_from(width)?, i32::try_from(height)?)?;
        let elapsed = now.elapsed();
        total += elapsed;
        fps = fps_counter.update(elapsed);
        debug!("frame {} processed in {:?} fps: {:.1}", frame, elapsed, fps);
        output = Some(frame);
    }
    let output = output.context("no frame processed")?;

    let edges = output.edge_count();
    let mean = total / repeat;
    image::RgbaImage::from_raw(output.width(), output.height(), output.as_bytes().to_vec())
        .context("output buffer does not match its dimensions")?
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        "saved {} resolution: {}x{} edge pixels: {} mean: {:.2?} fps: {:.1}",
        args.output.display(),
        output.width(),
        output.height(),
        edges,
        mean,
        fps
    );

    if args.stats {
        let stats = json!({
            "width": output.width(),
            "height": output.height(),
            "input_bytes": nv21.len(),
            "output_bytes": output.size(),
            "edge_pixels": edges,
            "frames": repeat,
            "mean_ms": mean.as_secs_f64() * 1000.0,
            "fps": fps,
        });
        println!("{stats}");
    }

    Ok(())
}
