//! Pixel-to-plane mapping
//!
//! A [`Viewport`] is the rectangle of the complex plane an image covers. Pixel
//! `x = 0` maps to `left` and `x = width` to `right`; `y = 0` maps to `top` and
//! `y = height` to `bottom`.

use crate::complex::Complex;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Affine remap of a pixel coordinate onto `[range_low, range_high]`.
///
/// `pixel_extent` must be positive; that is the caller's responsibility.
#[inline]
pub fn map(pixel: f32, pixel_extent: f32, range_low: f32, range_high: f32) -> f32 {
    range_low + (range_high - range_low) * (pixel / pixel_extent)
}

/// Remap `value` from `[from_low, from_high]` onto `[to_low, to_high]`
#[inline]
pub fn remap(value: f32, from_low: f32, from_high: f32, to_low: f32, to_high: f32) -> f32 {
    let t = (value - from_low) / (from_high - from_low);
    to_low * (1.0 - t) + to_high * t
}

/// Logarithm of `x` in base `base`
#[inline]
pub fn log_base(base: f32, x: f32) -> f32 {
    x.ln() / base.ln()
}

/// Rectangle of the mapped plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Viewport {
    /// The classic full view of the Mandelbrot set
    fn default() -> Self {
        Self::new(-2.25, 0.75, -1.5, 1.5)
    }
}

impl Viewport {
    pub const fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Build a viewport around `center` where `scale` pixels span one unit.
    ///
    /// The half-width is `width / (2·scale)` and the half-height is
    /// `height / (2·scale)`, so the aspect ratio always matches the image.
    pub fn from_center(center: Vec2, scale: f32, width: u32, height: u32) -> Self {
        let half_width = width as f32 / (2.0 * scale);
        let half_height = height as f32 / (2.0 * scale);
        Self::new(
            center.x - half_width,
            center.x + half_width,
            center.y - half_height,
            center.y + half_height,
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// `[left, right, top, bottom]`, the layout kernels receive as a uniform
    pub fn as_array(&self) -> [f32; 4] {
        [self.left, self.right, self.top, self.bottom]
    }

    /// Map pixel `(x, y)` of a `width × height` image into the plane
    pub fn map_pixel(&self, x: u32, y: u32, width: u32, height: u32) -> Complex {
        Complex::new(
            map(x as f32, width as f32, self.left, self.right),
            map(y as f32, height as f32, self.top, self.bottom),
        )
    }
}
