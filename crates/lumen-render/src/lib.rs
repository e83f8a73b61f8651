//! Lumen Render - frame production and presentation
//!
//! [`FrameLoop`] turns a stream of per-frame kernels into presented images:
//! it owns a host working image, a device-side working texture and a pair of
//! back buffers, and handles resize, barriers, submission and fence
//! throttling. The device itself sits behind [`PresentBackend`].
//!
//! ## Backends
//!
//! - [`SoftwareBackend`]: host memory only, with allocation tracking and
//!   barrier validation; used headless and in tests
//! - [`WgpuBackend`]: a wgpu device with an emulated fence
//!
//! ## Example
//!
//! ```rust
//! use lumen_core::Extent;
//! use lumen_core::fractal::{FractalKernel, FractalParams};
//! use lumen_render::{FrameLoop, SoftwareBackend, SurfaceHandle, source::Fixed};
//!
//! let surface = SurfaceHandle::new(Extent::new(32, 32));
//! let mut frames = FrameLoop::new(Fixed(FractalKernel::new(FractalParams::default())));
//! frames.initialize(SoftwareBackend::new(surface))?;
//! frames.on_update(0.0)?;
//! frames.shutdown()?;
//! # Ok::<(), lumen_render::RenderError>(())
//! ```

pub mod backend;
pub mod frame_loop;
pub mod gpu;
pub mod software;
pub mod source;
pub mod surface;

mod error;

pub use backend::{PresentBackend, ResourceState, SwapChain, Tracked};
pub use error::{RenderError, Result};
pub use frame_loop::{FrameLoop, FrameOutcome, FrameStats, LoopState};
pub use gpu::{WgpuBackend, init_headless};
pub use software::{
    AllocationInfo, AllocationTracker, FrameOp, ResourceKind, SoftResource, SoftwareBackend,
};
pub use source::{FrameContext, KernelSource, from_fn};
pub use surface::SurfaceHandle;

// Re-export wgpu for callers that build their own device
pub use wgpu;
