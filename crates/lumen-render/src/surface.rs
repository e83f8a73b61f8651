//! Shared handle to the output surface size

use lumen_core::Extent;
use parking_lot::Mutex;
use std::sync::Arc;

/// Size of the output surface, shared between whoever owns the window (or
/// stands in for one) and the backend that presents into it
#[derive(Debug, Clone, Default)]
pub struct SurfaceHandle {
    extent: Arc<Mutex<Extent>>,
}

impl SurfaceHandle {
    pub fn new(extent: Extent) -> Self {
        Self {
            extent: Arc::new(Mutex::new(extent)),
        }
    }

    pub fn extent(&self) -> Extent {
        *self.extent.lock()
    }

    /// Change the surface size; the loop picks it up after `on_resize`
    pub fn set_extent(&self, extent: Extent) {
        *self.extent.lock() = extent;
    }
}
