//! Writing rendered frames to disk

use anyhow::{Context, Result};
use lumen_core::PixelGrid;
use std::path::{Path, PathBuf};

/// Supported image file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Portable Network Graphics
    #[default]
    Png,

    /// Windows bitmap, fast to write for long frame sequences
    Bmp,
}

impl ImageFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// Parse format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// Infer format from a file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// Encode `grid` to `path`, creating parent directories as needed.
///
/// A path without an extension gets `.png`. Returns the path written.
pub fn save_image(grid: &PixelGrid, path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut path = path.as_ref().to_path_buf();
    if path.extension().is_none() {
        path.set_extension(ImageFormat::default().extension());
    }
    let format = ImageFormat::from_path(&path)
        .with_context(|| format!("Unsupported image format: {}", path.display()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    grid.to_image()
        .save_with_format(&path, format.into())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
