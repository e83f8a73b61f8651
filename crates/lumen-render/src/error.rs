//! Error types for the presentation layer

use crate::backend::ResourceState;
use thiserror::Error;

/// Result type alias using the render error type
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors raised while driving frames to a surface
#[derive(Error, Debug)]
pub enum RenderError {
    /// `on_update` or `on_resize` before `initialize`
    #[error("Frame loop is not initialized")]
    Uninitialized,

    /// Any call after `shutdown`
    #[error("Frame loop has been shut down")]
    ShutDown,

    /// `initialize` on a loop that is already running
    #[error("Frame loop is already initialized")]
    AlreadyInitialized,

    /// No adapter or device could be acquired
    #[error("Device creation failed: {0}")]
    DeviceCreation(String),

    /// A texture or buffer could not be allocated
    #[error("Resource creation failed at {extent}: {reason}")]
    ResourceCreation {
        extent: lumen_core::Extent,
        reason: String,
    },

    /// Buffers cannot be sized to a zero-area surface
    #[error("Surface has zero size")]
    ZeroSizedSurface,

    /// A resource was used in a state it is not in
    #[error("Resource {resource} is in state {actual:?}, expected {expected:?}")]
    InvalidTransition {
        resource: u64,
        expected: ResourceState,
        actual: ResourceState,
    },

    /// Fence values must strictly increase
    #[error("Fence value {value} does not exceed last signalled value {last}")]
    FenceRegression { value: u64, last: u64 },

    /// Presentation surface error
    #[error("Surface error: {0}")]
    Surface(String),

    /// The device stopped responding
    #[error("Device lost: {0}")]
    DeviceLost(String),

    /// Kernel construction failed
    #[error(transparent)]
    Kernel(#[from] lumen_core::Error),
}
