//! Driving the frame loop without a window

use crate::output::save_image;
use anyhow::{Context, Result};
use lumen_core::Extent;
use lumen_core::animation::preview_power;
use lumen_core::fractal::{FractalKernel, FractalParams};
use lumen_core::kernel::Kernel;
use lumen_core::prelude::Vec4;
use lumen_core::raymarch::SceneKernel;
use lumen_core::scene::SceneDescription;
use lumen_render::{
    FrameContext, FrameLoop, FrameOutcome, FrameStats, KernelSource, PresentBackend,
    SoftwareBackend, SurfaceHandle, WgpuBackend,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// What the loop draws
#[derive(Debug, Clone)]
pub enum Subject {
    Fractal {
        params: FractalParams,
        /// Drive the exponent from elapsed time
        animate: bool,
    },
    Scene(SceneDescription),
}

/// Either kernel, chosen per run
#[derive(Debug, Clone)]
pub enum AnyKernel {
    Fractal(FractalKernel),
    Scene(SceneKernel),
}

impl Kernel for AnyKernel {
    fn shade(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4 {
        match self {
            AnyKernel::Fractal(kernel) => kernel.shade(x, y, width, height),
            AnyKernel::Scene(kernel) => kernel.shade(x, y, width, height),
        }
    }
}

impl KernelSource for Subject {
    type Kernel = AnyKernel;

    fn kernel_for(&mut self, frame: &FrameContext) -> lumen_render::Result<AnyKernel> {
        match self {
            Subject::Fractal { params, animate } => {
                let mut params = params.clone();
                if *animate {
                    params.power = preview_power(frame.time);
                }
                Ok(AnyKernel::Fractal(FractalKernel::new(params)))
            }
            Subject::Scene(scene) => Ok(AnyKernel::Scene(scene.kernel(frame.extent)?)),
        }
    }
}

/// Which device presents the frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Software,
    Wgpu,
}

#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub frames: u32,
    pub extent: Extent,
    /// Resize the surface to this halfway through the run
    pub resize_to: Option<Extent>,
    pub backend: BackendKind,
    /// Write the last presented frame here
    pub output: Option<PathBuf>,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            frames: 60,
            extent: Extent::new(640, 480),
            resize_to: None,
            backend: BackendKind::default(),
            output: None,
        }
    }
}

/// What a headless run did
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub presented: u32,
    pub skipped: u32,
    pub stats: FrameStats,
    pub final_extent: Option<Extent>,
    pub output: Option<PathBuf>,
}

/// Run `subject` for `options.frames` frames
pub fn run_headless(subject: Subject, options: &HeadlessOptions) -> Result<HeadlessReport> {
    let surface = SurfaceHandle::new(options.extent);
    info!(
        "Headless run: {} frames at {} on {:?}",
        options.frames, options.extent, options.backend
    );
    match options.backend {
        BackendKind::Software => {
            let backend = SoftwareBackend::new(surface.clone()).with_immediate_completion(true);
            drive(backend, surface, subject, options)
        }
        BackendKind::Wgpu => {
            let backend = WgpuBackend::headless(surface.clone())
                .context("Failed to create a wgpu device")?;
            drive(backend, surface, subject, options)
        }
    }
}

fn drive<B: PresentBackend>(
    backend: B,
    surface: SurfaceHandle,
    subject: Subject,
    options: &HeadlessOptions,
) -> Result<HeadlessReport> {
    let mut frames = FrameLoop::new(subject);
    frames.initialize(backend)?;

    let started = Instant::now();
    let halfway = options.frames / 2;
    let mut presented = 0;
    let mut skipped = 0;
    for i in 0..options.frames {
        if let Some(extent) = options.resize_to.filter(|_| i == halfway) {
            surface.set_extent(extent);
            frames.on_resize()?;
        }
        match frames.on_update(started.elapsed().as_secs_f32())? {
            FrameOutcome::Presented { fence, .. } => {
                debug!("Frame {i} presented with fence {fence}");
                presented += 1;
            }
            FrameOutcome::Skipped => skipped += 1,
        }
    }

    let output = match (&options.output, frames.capture()?) {
        (Some(path), Some(image)) => Some(save_image(&image, path)?),
        _ => None,
    };
    let report = HeadlessReport {
        presented,
        skipped,
        stats: frames.stats(),
        final_extent: frames.extent(),
        output,
    };
    frames.shutdown()?;
    Ok(report)
}
