//! Escape-time fractal kernel with smooth colouring
//!
//! Each pixel maps to a point `c` of the complex plane and iterates
//! `z ← z^p + c` from `z = 0` until `|z| > 2` or the iteration budget runs out.
//! Escaping points get a continuous iteration estimate that indexes the
//! palette; points that never escape get the interior colour.

use crate::kernel::Kernel;
use glam::Vec4;
use lumen_math::{Color, Complex, Palette, Viewport};
use serde::{Deserialize, Serialize};

/// Divergence radius of the iteration
pub const ESCAPE_RADIUS: f32 = 2.0;

/// Upper clamp of the normalized escape value, keeps the last bucket from
/// wrapping onto palette entry 0
pub const MAX_ESCAPE_T: f32 = 0.999;

/// Colour given to points that never escape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteriorColor {
    /// Plain black
    Black,
    /// The final palette entry
    #[default]
    LastPaletteEntry,
}

/// Everything a fractal frame depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalParams {
    pub viewport: Viewport,
    pub max_iterations: u32,
    /// Real exponent `p` of `z^p + c`; may be fractional or animated
    pub power: f32,
    pub palette: Palette,
    pub interior: InteriorColor,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            max_iterations: 50,
            power: 2.0,
            palette: Palette::default(),
            interior: InteriorColor::default(),
        }
    }
}

impl FractalParams {
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_interior(mut self, interior: InteriorColor) -> Self {
        self.interior = interior;
        self
    }
}

/// Outcome of iterating a single point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escape {
    /// Iterations performed before `|z|` exceeded the radius (or the budget)
    pub iterations: u32,
    /// Final value of `z`
    pub z: Complex,
}

/// Escape-time kernel over a [`Viewport`]
#[derive(Debug, Clone)]
pub struct FractalKernel {
    params: FractalParams,
}

impl FractalKernel {
    pub fn new(params: FractalParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    /// Iterate `z ← z^p + c` from zero
    pub fn iterate(&self, c: Complex) -> Escape {
        let exponent = Complex::real(self.params.power);
        let mut z = Complex::ZERO;
        let mut i = 0;
        while i < self.params.max_iterations && z.abs() <= ESCAPE_RADIUS {
            z = z.pow(exponent) + c;
            i += 1;
        }
        Escape { iterations: i, z }
    }

    /// Normalized smooth escape value in `[0, 0.999]`, or `1` for interior points.
    ///
    /// `t = (i + 1 − log(log|z|) / log 2) / max_iterations`
    pub fn smooth_value(&self, escape: Escape) -> f32 {
        let max = self.params.max_iterations;
        if escape.iterations >= max {
            return 1.0;
        }
        let nu = escape.z.abs().ln().ln() / std::f32::consts::LN_2;
        let t = (escape.iterations as f32 + 1.0 - nu) / max as f32;
        // z overflowed (huge or negative powers); treat as escaped at once
        if !t.is_finite() {
            return 0.0;
        }
        t.clamp(0.0, MAX_ESCAPE_T)
    }

    /// Colour of a single point of the plane
    pub fn color_at(&self, c: Complex) -> Color {
        let escape = self.iterate(c);
        if escape.iterations >= self.params.max_iterations {
            return match self.params.interior {
                InteriorColor::Black => Color::BLACK,
                InteriorColor::LastPaletteEntry => self.params.palette.last(),
            };
        }
        self.params.palette.lookup(self.smooth_value(escape))
    }
}

impl Kernel for FractalKernel {
    fn shade(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4 {
        let c = self.params.viewport.map_pixel(x, y, width, height);
        self.color_at(c).to_rgba()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn kernel() -> FractalKernel {
        FractalKernel::new(FractalParams::default())
    }

    #[test]
    fn origin_never_escapes() {
        let k = kernel();
        let escape = k.iterate(Complex::ZERO);
        assert_eq!(escape.iterations, 50);
        assert_eq!(k.smooth_value(escape), 1.0);
    }

    #[test]
    fn far_point_escapes_quickly() {
        let k = kernel();
        let escape = k.iterate(Complex::new(2.0, 2.0));
        // |c| = 2.83 > 2 after the first step
        assert_eq!(escape.iterations, 1);
        let t = k.smooth_value(escape);
        assert!((0.0..=MAX_ESCAPE_T).contains(&t));
    }

    #[test]
    fn smooth_value_is_clamped() {
        let k = kernel().with_iterations_for_test(4);
        for c in [
            Complex::new(-0.75, 0.1),
            Complex::new(0.3, 0.5),
            Complex::new(-2.0, 0.0),
            Complex::new(10.0, 10.0),
        ] {
            let escape = k.iterate(c);
            let t = k.smooth_value(escape);
            assert!((0.0..=1.0).contains(&t), "t = {t} out of range for {c:?}");
            if escape.iterations < 4 {
                assert!(t <= MAX_ESCAPE_T);
            }
        }
    }

    #[test]
    fn interior_policy_controls_inside_colour() {
        let params = FractalParams::default();
        let last = FractalKernel::new(params.clone()).color_at(Complex::ZERO);
        assert_eq!(last, Color::BLUE);

        let black = FractalKernel::new(params.with_interior(InteriorColor::Black))
            .color_at(Complex::ZERO);
        assert_eq!(black, Color::BLACK);
    }

    #[test]
    fn shading_is_deterministic() {
        let k = FractalKernel::new(FractalParams::default().with_power(3.7));
        for (x, y) in [(0, 0), (13, 77), (99, 99), (50, 42)] {
            let a = k.shade(x, y, 100, 100);
            let b = k.shade(x, y, 100, 100);
            assert_eq!(a.to_array().map(f32::to_bits), b.to_array().map(f32::to_bits));
        }
    }

    #[test]
    fn fractional_power_produces_finite_colours() {
        let k = FractalKernel::new(FractalParams::default().with_power(2.5));
        for y in (0..64).step_by(7) {
            for x in (0..64).step_by(7) {
                let px = k.shade(x, y, 64, 64);
                assert!(px.is_finite(), "non-finite colour at ({x}, {y})");
            }
        }
    }

    #[test]
    fn overflowed_z_maps_to_palette_start() {
        let k = kernel();
        for z in [
            Complex::new(f32::NAN, 0.0),
            Complex::new(f32::INFINITY, f32::NAN),
        ] {
            assert_eq!(k.smooth_value(Escape { iterations: 3, z }), 0.0);
        }

        let wild = FractalKernel::new(FractalParams::default().with_power(-40.0));
        for (x, y) in [(0, 0), (31, 17), (50, 50)] {
            assert!(wild.shade(x, y, 64, 64).is_finite());
        }
    }

    impl FractalKernel {
        fn with_iterations_for_test(mut self, max_iterations: u32) -> Self {
            self.params.max_iterations = max_iterations;
            self
        }
    }
}
