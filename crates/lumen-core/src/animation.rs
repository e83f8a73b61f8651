//! Time-varying kernels and parameter schedules

use crate::kernel::Kernel;
use lumen_math::remap;

/// Builds a fresh kernel for each point in time.
///
/// Wraps a factory `Fn(seconds) -> K` so a frame producer can rebuild its
/// kernel once per frame without knowing what varies.
#[derive(Debug, Clone, Copy)]
pub struct Animated<F> {
    factory: F,
}

impl<F, K> Animated<F>
where
    F: Fn(f32) -> K,
    K: Kernel,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn at(&self, seconds: f32) -> K {
        (self.factory)(seconds)
    }
}

/// Exponent used by the live preview: oscillates between 2 and 6
pub fn preview_power(seconds: f32) -> f32 {
    ((seconds / 2.0).cos() + 2.0) * 2.0
}

/// Linear ramp from `from` at frame 0 to `to` at frame `count - 1`
pub fn power_ramp(frame: usize, count: usize, from: f32, to: f32) -> f32 {
    if count <= 1 {
        return from;
    }
    remap(frame as f32, 0.0, (count - 1) as f32, from, to)
}
