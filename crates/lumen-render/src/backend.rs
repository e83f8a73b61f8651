//! The device seam the frame loop drives
//!
//! A backend owns a device, a command queue, a fence and an output surface.
//! The frame loop owns every resource the backend hands out and decides when
//! they are created, transitioned, copied, presented and dropped.

use crate::Result;
use lumen_core::{Extent, PixelGrid};

/// Usage state of a GPU resource between commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Kernel-writable working texture
    UnorderedAccess,
    CopySource,
    CopyDest,
    /// Presentable back buffer
    Common,
}

/// Freshly sized presentation buffers
pub struct SwapChain<B> {
    pub buffers: [B; 2],
    /// Index of the buffer the next frame renders into
    pub current_index: usize,
}

/// A device able to present frames produced on the host
pub trait PresentBackend {
    /// Working texture kernels write into
    type Texture;
    /// Presentation buffer
    type Buffer;

    /// Current size of the output surface
    fn surface_extent(&self) -> Extent;

    /// Allocate a working texture in [`ResourceState::UnorderedAccess`]
    fn create_texture(&mut self, extent: Extent) -> Result<Self::Texture>;

    /// Allocate both back buffers in [`ResourceState::Common`]
    fn resize_buffers(&mut self, extent: Extent) -> Result<SwapChain<Self::Buffer>>;

    /// Copy host pixels into the working texture
    fn upload(&mut self, texture: &Self::Texture, pixels: &PixelGrid) -> Result<()>;

    fn transition_texture(
        &mut self,
        texture: &Self::Texture,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<()>;

    fn transition_buffer(
        &mut self,
        buffer: &Self::Buffer,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<()>;

    /// Record a full copy of `texture` into `buffer`
    fn copy(&mut self, texture: &Self::Texture, buffer: &Self::Buffer) -> Result<()>;

    /// Submit everything recorded since the last submit
    fn submit(&mut self) -> Result<()>;

    /// Ask the queue to raise the fence to `value` once prior work finishes
    fn signal(&mut self, value: u64) -> Result<()>;

    /// Highest fence value known to have completed
    fn completed_value(&mut self) -> Result<u64>;

    /// Block until the fence reaches `value`
    fn wait_for(&mut self, value: u64) -> Result<()>;

    fn present(&mut self, buffer: &Self::Buffer) -> Result<()>;

    /// Read a presented buffer back to the host
    fn read_back(&mut self, buffer: &Self::Buffer) -> Result<PixelGrid>;
}

/// A resource together with the state the loop last moved it into
#[derive(Debug)]
pub struct Tracked<T> {
    pub resource: T,
    pub state: ResourceState,
}

impl<T> Tracked<T> {
    pub fn new(resource: T, state: ResourceState) -> Self {
        Self { resource, state }
    }
}
