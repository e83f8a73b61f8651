//! Error types for Lumen math

use thiserror::Error;

/// Errors raised when building a [`Palette`](crate::Palette)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteError {
    /// A palette needs at least one colour to be looked up
    #[error("Palette must contain at least one colour")]
    Empty,
}
