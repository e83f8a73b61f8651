//! Lumen Math - numeric building blocks shared by every Lumen kernel
//!
//! Everything in this crate is a plain value type or a pure function, so it can
//! be evaluated per pixel from many threads at once without synchronization.
//!
//! # Example
//!
//! ```rust
//! use lumen_math::{Color, Complex, Palette, Viewport};
//!
//! let viewport = Viewport::new(-2.0, 1.0, -1.5, 1.5);
//! let c = viewport.map_pixel(50, 50, 100, 100);
//! let z = Complex::ZERO.pow(Complex::real(2.0)) + c;
//! assert_eq!(z, c);
//!
//! let palette = Palette::new(vec![Color::RED, Color::BLUE]).unwrap();
//! assert_eq!(palette.lookup(0.0), Color::RED);
//! ```

mod color;
mod complex;
mod error;
mod viewport;

pub use color::{Color, Palette};
pub use complex::Complex;
pub use error::PaletteError;
pub use viewport::{Viewport, log_base, map, remap};

// Re-export glam so downstream crates agree on vector types
pub use glam;
