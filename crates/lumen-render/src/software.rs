//! In-memory device for headless runs and tests
//!
//! Resources live in a shared registry and remove themselves when their
//! handle drops, so a test can ask exactly which allocations are alive.
//! Barriers are validated against each resource's recorded state, and the
//! fence either completes on signal or only when waited on.

use crate::backend::{PresentBackend, ResourceState, SwapChain};
use crate::surface::SurfaceHandle;
use crate::{RenderError, Result};
use lumen_core::{Extent, PixelGrid};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// What a live allocation is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    WorkingTexture,
    BackBuffer,
}

/// Per-frame backend calls that can be made to fail once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOp {
    Upload,
    Copy,
    Submit,
    Signal,
    Present,
    Wait,
}

/// Snapshot of one live allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationInfo {
    pub id: u64,
    pub kind: ResourceKind,
    pub extent: Extent,
    pub state: ResourceState,
}

struct Allocation {
    kind: ResourceKind,
    extent: Extent,
    state: ResourceState,
    pixels: Vec<[u8; 4]>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    live: HashMap<u64, Allocation>,
}

/// Handle to a software allocation, released on drop
#[derive(Debug)]
pub struct SoftResource {
    id: u64,
    registry: Arc<Mutex<Registry>>,
}

impl SoftResource {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for SoftResource {
    fn drop(&mut self) {
        self.registry.lock().live.remove(&self.id);
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("next_id", &self.next_id)
            .field("live", &self.live.len())
            .finish()
    }
}

/// Shared view of a [`SoftwareBackend`]'s live allocations
#[derive(Debug, Clone)]
pub struct AllocationTracker {
    registry: Arc<Mutex<Registry>>,
}

impl AllocationTracker {
    pub fn live_allocations(&self) -> Vec<AllocationInfo> {
        let registry = self.registry.lock();
        let mut live: Vec<_> = registry
            .live
            .iter()
            .map(|(&id, a)| AllocationInfo {
                id,
                kind: a.kind,
                extent: a.extent,
                state: a.state,
            })
            .collect();
        live.sort_by_key(|a| a.id);
        live
    }
}

/// Host-memory [`PresentBackend`]
#[derive(Debug)]
pub struct SoftwareBackend {
    surface: SurfaceHandle,
    registry: Arc<Mutex<Registry>>,
    immediate_completion: bool,
    last_signalled: u64,
    completed: u64,
    pending_copies: Vec<(u64, u64)>,
    queued_copies: Vec<(u64, u64)>,
    signals: Vec<u64>,
    waits: u64,
    presented: Vec<u64>,
    failing_extent: Option<Extent>,
    failing_op: Option<FrameOp>,
}

impl SoftwareBackend {
    pub fn new(surface: SurfaceHandle) -> Self {
        Self {
            surface,
            registry: Arc::new(Mutex::new(Registry::default())),
            immediate_completion: false,
            last_signalled: 0,
            completed: 0,
            pending_copies: Vec::new(),
            queued_copies: Vec::new(),
            signals: Vec::new(),
            waits: 0,
            presented: Vec::new(),
            failing_extent: None,
            failing_op: None,
        }
    }

    /// Complete each fence value as soon as it is signalled, so frames never
    /// need to throttle
    pub fn with_immediate_completion(mut self, immediate: bool) -> Self {
        self.immediate_completion = immediate;
        self
    }

    /// Make every allocation at `extent` fail
    pub fn fail_allocations_at(&mut self, extent: Option<Extent>) {
        self.failing_extent = extent;
    }

    /// Make the next call of `op` fail; later calls succeed again
    pub fn fail_next(&mut self, op: FrameOp) {
        self.failing_op = Some(op);
    }

    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    /// Handle that can inspect allocations after the backend is gone
    pub fn tracker(&self) -> AllocationTracker {
        AllocationTracker {
            registry: Arc::clone(&self.registry),
        }
    }

    /// Every allocation that has not been dropped yet
    pub fn live_allocations(&self) -> Vec<AllocationInfo> {
        self.tracker().live_allocations()
    }

    /// Fence values in the order they were signalled
    pub fn signals(&self) -> &[u64] {
        &self.signals
    }

    /// Number of blocking fence waits
    pub fn waits(&self) -> u64 {
        self.waits
    }

    /// Buffer ids in presentation order
    pub fn presented(&self) -> &[u64] {
        &self.presented
    }

    fn allocate(&mut self, kind: ResourceKind, extent: Extent, state: ResourceState) -> Result<SoftResource> {
        if extent.is_empty() {
            return Err(RenderError::ZeroSizedSurface);
        }
        if self.failing_extent == Some(extent) {
            return Err(RenderError::ResourceCreation {
                extent,
                reason: "allocation refused".into(),
            });
        }
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.live.insert(
            id,
            Allocation {
                kind,
                extent,
                state,
                pixels: vec![[0; 4]; extent.pixel_count()],
            },
        );
        trace!("Allocated {kind:?} #{id} at {extent}");
        Ok(SoftResource {
            id,
            registry: Arc::clone(&self.registry),
        })
    }

    fn refuse(&mut self, op: FrameOp) -> Result<()> {
        if self.failing_op == Some(op) {
            self.failing_op = None;
            return Err(RenderError::Surface(format!("{op:?} refused")));
        }
        Ok(())
    }

    fn transition(&mut self, id: u64, from: ResourceState, to: ResourceState) -> Result<()> {
        let mut registry = self.registry.lock();
        let allocation = registry
            .live
            .get_mut(&id)
            .ok_or_else(|| RenderError::DeviceLost(format!("resource #{id} was released")))?;
        if allocation.state != from {
            return Err(RenderError::InvalidTransition {
                resource: id,
                expected: from,
                actual: allocation.state,
            });
        }
        allocation.state = to;
        Ok(())
    }

    fn expect_state(registry: &Registry, id: u64, expected: ResourceState) -> Result<()> {
        let allocation = registry
            .live
            .get(&id)
            .ok_or_else(|| RenderError::DeviceLost(format!("resource #{id} was released")))?;
        if allocation.state != expected {
            return Err(RenderError::InvalidTransition {
                resource: id,
                expected,
                actual: allocation.state,
            });
        }
        Ok(())
    }

    /// Execute submitted copies, as the GPU would by the time a fence passes
    fn run_queued(&mut self) {
        let mut registry = self.registry.lock();
        for (src, dst) in self.queued_copies.drain(..) {
            let Some(pixels) = registry.live.get(&src).map(|a| a.pixels.clone()) else {
                continue;
            };
            if let Some(target) = registry.live.get_mut(&dst) {
                target.pixels = pixels;
            }
        }
    }
}

impl PresentBackend for SoftwareBackend {
    type Texture = SoftResource;
    type Buffer = SoftResource;

    fn surface_extent(&self) -> Extent {
        self.surface.extent()
    }

    fn create_texture(&mut self, extent: Extent) -> Result<SoftResource> {
        self.allocate(ResourceKind::WorkingTexture, extent, ResourceState::UnorderedAccess)
    }

    fn resize_buffers(&mut self, extent: Extent) -> Result<SwapChain<SoftResource>> {
        let front = self.allocate(ResourceKind::BackBuffer, extent, ResourceState::Common)?;
        let back = self.allocate(ResourceKind::BackBuffer, extent, ResourceState::Common)?;
        Ok(SwapChain {
            buffers: [front, back],
            current_index: 0,
        })
    }

    fn upload(&mut self, texture: &SoftResource, pixels: &PixelGrid) -> Result<()> {
        self.refuse(FrameOp::Upload)?;
        let mut registry = self.registry.lock();
        Self::expect_state(&registry, texture.id, ResourceState::UnorderedAccess)?;
        let allocation = registry
            .live
            .get_mut(&texture.id)
            .ok_or_else(|| RenderError::DeviceLost(format!("resource #{} was released", texture.id)))?;
        if allocation.extent != pixels.extent() {
            return Err(RenderError::Surface(format!(
                "upload of {} into {} texture",
                pixels.extent(),
                allocation.extent
            )));
        }
        allocation.pixels.copy_from_slice(pixels.pixels());
        Ok(())
    }

    fn transition_texture(&mut self, texture: &SoftResource, from: ResourceState, to: ResourceState) -> Result<()> {
        self.transition(texture.id, from, to)
    }

    fn transition_buffer(&mut self, buffer: &SoftResource, from: ResourceState, to: ResourceState) -> Result<()> {
        self.transition(buffer.id, from, to)
    }

    fn copy(&mut self, texture: &SoftResource, buffer: &SoftResource) -> Result<()> {
        self.refuse(FrameOp::Copy)?;
        let registry = self.registry.lock();
        Self::expect_state(&registry, texture.id, ResourceState::CopySource)?;
        Self::expect_state(&registry, buffer.id, ResourceState::CopyDest)?;
        drop(registry);
        self.pending_copies.push((texture.id, buffer.id));
        Ok(())
    }

    fn submit(&mut self) -> Result<()> {
        self.refuse(FrameOp::Submit)?;
        self.queued_copies.append(&mut self.pending_copies);
        Ok(())
    }

    fn signal(&mut self, value: u64) -> Result<()> {
        self.refuse(FrameOp::Signal)?;
        if value <= self.last_signalled {
            return Err(RenderError::FenceRegression {
                value,
                last: self.last_signalled,
            });
        }
        self.last_signalled = value;
        self.signals.push(value);
        if self.immediate_completion {
            self.run_queued();
            self.completed = value;
        }
        Ok(())
    }

    fn completed_value(&mut self) -> Result<u64> {
        Ok(self.completed)
    }

    fn wait_for(&mut self, value: u64) -> Result<()> {
        self.refuse(FrameOp::Wait)?;
        if value > self.last_signalled {
            return Err(RenderError::DeviceLost(format!(
                "waiting for fence {value} which was never signalled"
            )));
        }
        self.waits += 1;
        self.run_queued();
        self.completed = self.completed.max(value);
        Ok(())
    }

    fn present(&mut self, buffer: &SoftResource) -> Result<()> {
        self.refuse(FrameOp::Present)?;
        let registry = self.registry.lock();
        Self::expect_state(&registry, buffer.id, ResourceState::Common)?;
        drop(registry);
        self.presented.push(buffer.id);
        Ok(())
    }

    fn read_back(&mut self, buffer: &SoftResource) -> Result<PixelGrid> {
        self.run_queued();
        let registry = self.registry.lock();
        let allocation = registry
            .live
            .get(&buffer.id)
            .ok_or_else(|| RenderError::DeviceLost(format!("resource #{} was released", buffer.id)))?;
        let mut grid = PixelGrid::new(allocation.extent)?;
        grid.pixels_mut().copy_from_slice(&allocation.pixels);
        Ok(grid)
    }
}
