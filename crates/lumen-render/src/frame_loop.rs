//! The frame production state machine
//!
//! ```text
//! Uninitialized → Ready → (Resizing → Ready)* → ExecutingFrame → Ready → … → ShutDown
//! ```
//!
//! Each update renders one frame on the host, copies it into the idle back
//! buffer, presents it and waits for the GPU only if that frame has not yet
//! completed, so at most one frame is ever in flight. The fence value and
//! the active buffer index are owned here and only change between frames.

use crate::backend::{PresentBackend, ResourceState, Tracked};
use crate::source::{FrameContext, KernelSource};
use crate::{RenderError, Result};
use lumen_core::{Extent, PixelGrid, dispatch};
use tracing::{debug, info, trace, warn};

/// Lifecycle of a [`FrameLoop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Ready,
    Resizing,
    ExecutingFrame,
    ShutDown,
}

/// What one call to [`FrameLoop::on_update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented {
        buffer_index: usize,
        fence: u64,
        extent: Extent,
    },
    /// Nothing to draw into, e.g. a minimized surface
    Skipped,
}

/// Counters for tests and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    /// Successful reallocations
    pub resizes: u64,
    /// Full signal-and-wait drains before releasing resources
    pub drains: u64,
    /// Frames that had to wait for their own fence
    pub throttle_waits: u64,
    pub failed_resizes: u64,
}

/// Everything sized to the surface
struct Targets<B: PresentBackend> {
    extent: Extent,
    host: PixelGrid,
    texture: Tracked<B::Texture>,
    buffers: [Tracked<B::Buffer>; 2],
    current: usize,
    last_presented: Option<usize>,
}

/// Drives a [`KernelSource`] onto a [`PresentBackend`]
pub struct FrameLoop<B: PresentBackend, S> {
    state: LoopState,
    backend: Option<B>,
    source: S,
    targets: Option<Targets<B>>,
    resize_pending: bool,
    next_fence: u64,
    stats: FrameStats,
}

impl<B: PresentBackend, S: KernelSource> FrameLoop<B, S> {
    pub fn new(source: S) -> Self {
        Self {
            state: LoopState::Uninitialized,
            backend: None,
            source,
            targets: None,
            resize_pending: false,
            next_fence: 1,
            stats: FrameStats::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Size of the current targets, if any are allocated
    pub fn extent(&self) -> Option<Extent> {
        self.targets.as_ref().map(|t| t.extent)
    }

    /// Next fence value to be signalled
    pub fn next_fence(&self) -> u64 {
        self.next_fence
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Take ownership of the device. Targets are allocated lazily on the
    /// first update.
    pub fn initialize(&mut self, backend: B) -> Result<()> {
        match self.state {
            LoopState::Uninitialized => {}
            LoopState::ShutDown => return Err(RenderError::ShutDown),
            _ => return Err(RenderError::AlreadyInitialized),
        }
        info!("Frame loop initialized at {}", backend.surface_extent());
        self.backend = Some(backend);
        self.resize_pending = true;
        self.state = LoopState::Ready;
        Ok(())
    }

    /// Note that the surface changed size; handled on the next update
    pub fn on_resize(&mut self) -> Result<()> {
        self.ensure_ready()?;
        debug!("Resize requested");
        self.resize_pending = true;
        Ok(())
    }

    /// Produce and present one frame
    pub fn on_update(&mut self, time: f32) -> Result<FrameOutcome> {
        self.ensure_ready()?;

        if self.resize_pending {
            self.state = LoopState::Resizing;
            let resized = self.apply_resize();
            self.state = LoopState::Ready;
            resized?;
        }

        if self.targets.is_none() {
            return Ok(FrameOutcome::Skipped);
        }

        self.state = LoopState::ExecutingFrame;
        let outcome = self.execute_frame(time);
        self.state = LoopState::Ready;
        outcome
    }

    /// Read back the most recently presented buffer.
    ///
    /// Returns `None` until a frame has been presented into the current
    /// targets, so after a reallocation (including the fallback of a failed
    /// resize) nothing is captured until the next successful update.
    pub fn capture(&mut self) -> Result<Option<PixelGrid>> {
        let backend = self.backend.as_mut().ok_or(RenderError::ShutDown)?;
        let Some(targets) = self.targets.as_ref() else {
            return Ok(None);
        };
        let Some(index) = targets.last_presented else {
            return Ok(None);
        };
        backend.read_back(&targets.buffers[index].resource).map(Some)
    }

    /// Drain outstanding work and release every resource
    pub fn shutdown(&mut self) -> Result<()> {
        match self.state {
            LoopState::ShutDown => return Ok(()),
            LoopState::Uninitialized => {
                self.state = LoopState::ShutDown;
                return Ok(());
            }
            _ => {}
        }
        if self.targets.is_some() {
            self.drain()?;
        }
        self.targets = None;
        self.backend = None;
        self.state = LoopState::ShutDown;
        info!("Frame loop shut down after {} frames", self.stats.frames);
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            LoopState::Ready => Ok(()),
            LoopState::Uninitialized => Err(RenderError::Uninitialized),
            LoopState::ShutDown => Err(RenderError::ShutDown),
            // Only reachable if a previous call panicked mid-frame
            LoopState::Resizing | LoopState::ExecutingFrame => Err(RenderError::Surface(
                format!("frame loop re-entered while {:?}", self.state),
            )),
        }
    }

    fn backend_mut_or_err(&mut self) -> Result<&mut B> {
        self.backend.as_mut().ok_or(RenderError::Uninitialized)
    }

    /// Signal the next fence value and block until the GPU reaches it
    fn drain(&mut self) -> Result<()> {
        let fence = self.next_fence;
        let backend = self.backend.as_mut().ok_or(RenderError::Uninitialized)?;
        backend.signal(fence)?;
        self.next_fence += 1;
        backend.wait_for(fence)?;
        self.stats.drains += 1;
        debug!("Drained GPU at fence {fence}");
        Ok(())
    }

    fn apply_resize(&mut self) -> Result<()> {
        let extent = self.backend_mut_or_err()?.surface_extent();
        if extent.is_empty() {
            debug!("Surface is {extent}, keeping resize pending");
            return Ok(());
        }

        // Old targets may still be referenced by in-flight work
        if self.targets.is_some() {
            self.drain()?;
        }
        let previous = self.targets.take().map(|t| t.extent);

        let backend = self.backend.as_mut().ok_or(RenderError::Uninitialized)?;
        match allocate(backend, extent) {
            Ok(targets) => {
                info!("Allocated frame targets at {extent}");
                self.targets = Some(targets);
                self.resize_pending = false;
                self.stats.resizes += 1;
                Ok(())
            }
            Err(err) => {
                self.stats.failed_resizes += 1;
                let Some(previous) = previous else {
                    return Err(err);
                };
                warn!("Resize to {extent} failed ({err}), staying at {previous}");
                self.targets = Some(allocate(backend, previous)?);
                Ok(())
            }
        }
    }

    fn execute_frame(&mut self, time: f32) -> Result<FrameOutcome> {
        let (Some(backend), Some(targets)) = (self.backend.as_mut(), self.targets.as_mut()) else {
            return Ok(FrameOutcome::Skipped);
        };

        let frame = FrameContext {
            extent: targets.extent,
            time,
            frame_index: self.stats.frames,
        };
        let kernel = self.source.kernel_for(&frame)?;
        dispatch(&kernel, &mut targets.host);
        backend.upload(&targets.texture.resource, &targets.host)?;

        let index = targets.current;
        if let Err(err) = copy_to_buffer(backend, targets, index) {
            settle(backend, targets, index);
            return Err(err);
        }

        let fence = self.next_fence;
        backend.submit()?;
        backend.signal(fence)?;
        // A signalled value is spent even if the rest of the frame fails
        self.next_fence += 1;

        let presented = backend.present(&targets.buffers[index].resource);
        if presented.is_ok() {
            targets.last_presented = Some(index);
            targets.current ^= 1;
        }
        if backend.completed_value()? < fence {
            backend.wait_for(fence)?;
            self.stats.throttle_waits += 1;
        }
        presented?;
        self.stats.frames += 1;
        debug!("Presented frame {} into buffer {index} at fence {fence}", frame.frame_index);

        Ok(FrameOutcome::Presented {
            buffer_index: index,
            fence,
            extent: targets.extent,
        })
    }
}

fn allocate<B: PresentBackend>(backend: &mut B, extent: Extent) -> Result<Targets<B>> {
    let host = PixelGrid::new(extent)?;
    let texture = backend.create_texture(extent)?;
    let chain = backend.resize_buffers(extent)?;
    let [front, back] = chain.buffers;
    Ok(Targets {
        extent,
        host,
        texture: Tracked::new(texture, ResourceState::UnorderedAccess),
        buffers: [
            Tracked::new(front, ResourceState::Common),
            Tracked::new(back, ResourceState::Common),
        ],
        current: chain.current_index & 1,
        last_presented: None,
    })
}

/// Copy the working texture into back buffer `index` and return both to
/// their resting states
fn copy_to_buffer<B: PresentBackend>(
    backend: &mut B,
    targets: &mut Targets<B>,
    index: usize,
) -> Result<()> {
    transition_texture(backend, &mut targets.texture, ResourceState::CopySource)?;
    transition_buffer(backend, &mut targets.buffers[index], ResourceState::CopyDest)?;
    backend.copy(&targets.texture.resource, &targets.buffers[index].resource)?;
    transition_texture(backend, &mut targets.texture, ResourceState::UnorderedAccess)?;
    transition_buffer(backend, &mut targets.buffers[index], ResourceState::Common)
}

/// Best-effort return to resting states after a failed copy
fn settle<B: PresentBackend>(backend: &mut B, targets: &mut Targets<B>, index: usize) {
    if targets.texture.state != ResourceState::UnorderedAccess {
        let restored =
            transition_texture(backend, &mut targets.texture, ResourceState::UnorderedAccess);
        if let Err(err) = restored {
            warn!("Working texture stuck in {:?}: {err}", targets.texture.state);
        }
    }
    let buffer = &mut targets.buffers[index];
    if buffer.state != ResourceState::Common {
        if let Err(err) = transition_buffer(backend, buffer, ResourceState::Common) {
            warn!("Back buffer {index} stuck in {:?}: {err}", buffer.state);
        }
    }
}

fn transition_texture<B: PresentBackend>(
    backend: &mut B,
    texture: &mut Tracked<B::Texture>,
    to: ResourceState,
) -> Result<()> {
    trace!("Working texture {:?} -> {:?}", texture.state, to);
    backend.transition_texture(&texture.resource, texture.state, to)?;
    texture.state = to;
    Ok(())
}

fn transition_buffer<B: PresentBackend>(
    backend: &mut B,
    buffer: &mut Tracked<B::Buffer>,
    to: ResourceState,
) -> Result<()> {
    trace!("Back buffer {:?} -> {:?}", buffer.state, to);
    backend.transition_buffer(&buffer.resource, buffer.state, to)?;
    buffer.state = to;
    Ok(())
}
