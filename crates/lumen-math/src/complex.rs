//! Single-precision complex numbers
//!
//! Precision is `f32` to match what the GPU kernels evaluate.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// A complex number `real + imaginary·i`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Complex {
    pub real: f32,
    pub imaginary: f32,
}

impl Complex {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 0.0);

    pub const fn new(real: f32, imaginary: f32) -> Self {
        Self { real, imaginary }
    }

    /// A purely real number
    pub const fn real(value: f32) -> Self {
        Self::new(value, 0.0)
    }

    /// Euclidean norm `|z|`
    pub fn abs(self) -> f32 {
        (self.real * self.real + self.imaginary * self.imaginary).sqrt()
    }

    /// Squared norm, avoids the square root for escape tests
    pub fn norm_sqr(self) -> f32 {
        self.real * self.real + self.imaginary * self.imaginary
    }

    /// Argument `atan2(im, re)`
    pub fn arg(self) -> f32 {
        self.imaginary.atan2(self.real)
    }

    /// Raise to a complex exponent `c + d·i` through the polar form.
    ///
    /// With `ρ = |z|` and `θ = arg z` the result is
    /// `ρ^c · e^(-dθ) · (cos φ + i·sin φ)` where `φ = cθ + d·ln ρ`.
    ///
    /// A zero exponent yields `1` (including `0^0`) and a zero base yields `0`;
    /// both are handled before `ln(0)` or `atan2(0, 0)` can be reached.
    #[allow(clippy::float_cmp)]
    pub fn pow(self, exponent: Complex) -> Complex {
        if exponent.real == 0.0 && exponent.imaginary == 0.0 {
            return Self::ONE;
        }
        if self.real == 0.0 && self.imaginary == 0.0 {
            return Self::ZERO;
        }

        let (c, d) = (exponent.real, exponent.imaginary);
        let rho = self.abs();
        let theta = self.arg();
        let phi = c * theta + d * rho.ln();
        let magnitude = rho.powf(c) * (-d * theta).exp();

        Self::new(magnitude * phi.cos(), magnitude * phi.sin())
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.real + rhs.real, self.imaginary + rhs.imaginary)
    }
}

impl From<(f32, f32)> for Complex {
    fn from((real, imaginary): (f32, f32)) -> Self {
        Self::new(real, imaginary)
    }
}
