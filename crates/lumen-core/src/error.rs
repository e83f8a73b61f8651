//! Error types for Lumen core

use thiserror::Error;

/// Result type alias using Lumen's core Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building kernels or their inputs
#[derive(Error, Debug)]
pub enum Error {
    /// A shape tree references children that do not exist
    #[error("Invalid shape tree: {0}")]
    InvalidShapeTree(String),

    /// A pixel grid was requested with a zero dimension
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Palette construction failed
    #[error("Palette error: {0}")]
    Palette(#[from] lumen_math::PaletteError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene or parameter file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
