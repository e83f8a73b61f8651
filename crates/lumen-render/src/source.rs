//! Where each frame's kernel comes from

use crate::Result;
use lumen_core::Extent;
use lumen_core::animation::Animated;
use lumen_core::kernel::Kernel;

/// What a kernel source may depend on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub extent: Extent,
    /// Seconds since the loop started
    pub time: f32,
    /// Zero-based index of the frame being produced
    pub frame_index: u64,
}

/// Produces the kernel for one frame
pub trait KernelSource {
    type Kernel: Kernel;

    fn kernel_for(&mut self, frame: &FrameContext) -> Result<Self::Kernel>;
}

/// The same kernel every frame
#[derive(Debug, Clone)]
pub struct Fixed<K>(pub K);

impl<K: Kernel + Clone> KernelSource for Fixed<K> {
    type Kernel = K;

    fn kernel_for(&mut self, _frame: &FrameContext) -> Result<K> {
        Ok(self.0.clone())
    }
}

impl<F, K> KernelSource for Animated<F>
where
    F: Fn(f32) -> K,
    K: Kernel,
{
    type Kernel = K;

    fn kernel_for(&mut self, frame: &FrameContext) -> Result<K> {
        Ok(self.at(frame.time))
    }
}

/// Source backed by a closure over the whole frame context
pub struct FromFn<F>(F);

/// Build a [`KernelSource`] from a closure
pub fn from_fn<F, K>(f: F) -> FromFn<F>
where
    F: FnMut(&FrameContext) -> Result<K>,
    K: Kernel,
{
    FromFn(f)
}

impl<F, K> KernelSource for FromFn<F>
where
    F: FnMut(&FrameContext) -> Result<K>,
    K: Kernel,
{
    type Kernel = K;

    fn kernel_for(&mut self, frame: &FrameContext) -> Result<K> {
        (self.0)(frame)
    }
}
