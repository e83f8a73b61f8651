//! Parallel rendering of independent fractal frames

use crate::config::BatchConfig;
use crate::output::save_image;
use crate::progress::Progress;
use anyhow::{Context, Result};
use lumen_core::fractal::{FractalKernel, FractalParams};
use lumen_core::{Extent, PixelGrid, dispatch_sequential};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One frame of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProperties {
    pub params: FractalParams,
    pub extent: Extent,
    pub path: PathBuf,
}

/// Summary of a finished batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub frames: usize,
    pub elapsed: Duration,
    pub output_dir: PathBuf,
}

/// Render one frame on the calling thread
pub fn render_frame(params: &FractalParams, extent: Extent) -> Result<PixelGrid> {
    let mut grid = PixelGrid::new(extent)?;
    let kernel = FractalKernel::new(params.clone());
    dispatch_sequential(&kernel, &mut grid);
    Ok(grid)
}

/// Render and save every frame, one frame per worker.
///
/// Frames finish in any order; the first failure stops the batch.
pub fn render_sequence(frames: &[RenderProperties], progress: &Progress) -> Result<()> {
    frames.par_iter().try_for_each(|frame| {
        let grid = render_frame(&frame.params, frame.extent)
            .with_context(|| format!("Failed to render {}", frame.path.display()))?;
        let path = save_image(&grid, &frame.path)?;
        debug!("Wrote {}", path.display());
        progress.tick();
        Ok(())
    })
}

/// Build the per-frame properties of `config`
pub fn plan(config: &BatchConfig) -> Result<Vec<RenderProperties>> {
    (0..config.frames)
        .map(|index| {
            Ok(RenderProperties {
                params: config.frame_params(index),
                extent: config.extent(),
                path: config.frame_path(index)?,
            })
        })
        .collect()
}

/// Render the whole sequence described by `config`
pub fn render_batch(config: &BatchConfig) -> Result<BatchReport> {
    config.validate()?;
    let frames = plan(config)?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    info!(
        "Rendering {} frames at {} into {}",
        frames.len(),
        config.extent(),
        config.output_dir.display()
    );
    let started = Instant::now();
    let progress = Progress::new(frames.len());
    render_sequence(&frames, &progress)?;

    let report = BatchReport {
        frames: frames.len(),
        elapsed: started.elapsed(),
        output_dir: config.output_dir.clone(),
    };
    info!(
        "Rendered {} frames in {:.1}s",
        report.frames,
        report.elapsed.as_secs_f64()
    );
    Ok(report)
}
