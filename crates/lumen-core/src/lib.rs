//! # Lumen Core
//!
//! Per-pixel image kernels and the parallel dispatcher that runs them.
//!
//! Two kernels ship with the crate: an escape-time fractal with smooth
//! colouring ([`fractal::FractalKernel`]) and a sphere-traced signed distance
//! scene ([`raymarch::SceneKernel`]). Both are pure functions of the pixel
//! coordinate, so [`dispatch`] runs them row-parallel with no locking.
//!
//! ## Quick Start
//!
//! ```rust
//! use lumen_core::prelude::*;
//!
//! let params = FractalParams::default()
//!     .with_viewport(Viewport::new(-2.0, 1.0, -1.5, 1.5))
//!     .with_max_iterations(50);
//! let mut grid = PixelGrid::new(Extent::new(64, 64))?;
//! dispatch(&FractalKernel::new(params), &mut grid);
//! # Ok::<(), lumen_core::Error>(())
//! ```
//!
//! ## Conventions
//!
//! - Pixel `(0, 0)` is the top-left corner; rows run downward
//! - Scenes are right-handed and Y-up
//! - All kernel math is `f32`

pub mod animation;
pub mod camera;
pub mod fractal;
pub mod grid;
pub mod kernel;
pub mod raymarch;
pub mod scene;
pub mod sdf;

mod error;

pub use error::{Error, Result};
pub use grid::{Extent, PixelGrid};
pub use kernel::{Kernel, dispatch, dispatch_sequential};

/// Prelude module for convenient imports
pub mod prelude {
    // Kernels and dispatch
    pub use crate::fractal::{FractalKernel, FractalParams, InteriorColor};
    pub use crate::kernel::{Kernel, dispatch, dispatch_sequential};
    pub use crate::raymarch::{MarchSettings, Raymarcher, SceneKernel};

    // Scenes
    pub use crate::camera::{Camera, Light, LightMode, Ray};
    pub use crate::scene::SceneDescription;
    pub use crate::sdf::{Operation, Shape, ShapeArena, ShapeNode, ShapeType};

    // Time
    pub use crate::animation::{Animated, power_ramp, preview_power};

    // Targets
    pub use crate::grid::{Extent, PixelGrid};

    // Math
    pub use glam::{Mat4, Vec2, Vec3, Vec4};
    pub use lumen_math::{Color, Complex, Palette, Viewport};

    // Error handling
    pub use crate::{Error, Result};
}
