//! Lumen Engine - batch rendering, video assembly and headless runs
//!
//! A thin orchestration layer over lumen-core kernels and the lumen-render
//! frame loop: everything here touches the file system, spawns processes
//! or owns a wall clock.
//!
//! ## Example
//!
//! ```no_run
//! use lumen_engine::{BatchConfig, VideoJob, render_batch};
//!
//! let config = BatchConfig::default()
//!     .with_frames(120)
//!     .with_size(512, 512)
//!     .with_output_dir("frames");
//! let report = render_batch(&config)?;
//! VideoJob::new(&report.output_dir, "mandelbrot.mp4")
//!     .with_fps(config.fps)
//!     .run()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod batch;
pub mod config;
pub mod headless;
pub mod output;
pub mod progress;
pub mod video;

// Re-export commonly used types from dependencies
pub use lumen_core::animation::{Animated, power_ramp, preview_power};
pub use lumen_core::fractal::{FractalKernel, FractalParams, InteriorColor};
pub use lumen_core::scene::SceneDescription;
pub use lumen_core::{Extent, PixelGrid};

// Re-export our own types
pub use batch::{BatchReport, RenderProperties, render_batch, render_frame, render_sequence};
pub use config::{BatchConfig, frame_file_name};
pub use headless::{BackendKind, HeadlessOptions, HeadlessReport, Subject, run_headless};
pub use output::{ImageFormat, save_image};
pub use progress::{Progress, ProgressReport};
pub use video::{VideoJob, open_with_default_program};
