//! Host-side pixel storage that kernels write into

use crate::{Error, Result};
use glam::Vec4;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Size of a 2D image in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (e.g. a minimized window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Quantize a linear `[0, 1]` RGBA value to 8-bit unorm
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    [
        (color.x.clamp(0.0, 1.0) * 255.0) as u8,
        (color.y.clamp(0.0, 1.0) * 255.0) as u8,
        (color.z.clamp(0.0, 1.0) * 255.0) as u8,
        (color.w.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

/// Row-major RGBA8 image, the CPU half of the shared working texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    extent: Extent,
    pixels: Vec<[u8; 4]>,
}

impl PixelGrid {
    /// Allocate a transparent-black grid
    pub fn new(extent: Extent) -> Result<Self> {
        if extent.is_empty() {
            return Err(Error::InvalidDimensions {
                width: extent.width,
                height: extent.height,
            });
        }
        Ok(Self {
            extent,
            pixels: vec![[0; 4]; extent.pixel_count()],
        })
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.extent.width || y >= self.extent.height {
            return None;
        }
        Some(self.pixels[y as usize * self.extent.width as usize + x as usize])
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        &mut self.pixels
    }

    /// Tightly packed bytes, `4 * width` per row
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn fill(&mut self, value: [u8; 4]) {
        self.pixels.fill(value);
    }

    /// Copy into an [`image`] buffer for encoding
    pub fn to_image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.extent.width, self.extent.height);
        for (dst, src) in img.pixels_mut().zip(&self.pixels) {
            *dst = Rgba(*src);
        }
        img
    }

    /// Build from tightly packed RGBA8 bytes
    pub fn from_bytes(extent: Extent, bytes: &[u8]) -> Result<Self> {
        if extent.is_empty() || bytes.len() != extent.pixel_count() * 4 {
            return Err(Error::InvalidDimensions {
                width: extent.width,
                height: extent.height,
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Ok(Self { extent, pixels })
    }
}
