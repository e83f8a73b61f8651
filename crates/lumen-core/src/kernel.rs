//! The per-pixel kernel abstraction and grid dispatch
//!
//! A kernel is a pure function of its pixel coordinate and its own read-only
//! inputs. Dispatch runs it once per pixel of a [`PixelGrid`]; each invocation
//! writes exactly its own pixel, so rows are processed in parallel with no
//! synchronization and the result is identical to a sequential pass.

use crate::grid::{PixelGrid, to_rgba8};
use glam::Vec4;
use rayon::prelude::*;

/// A per-pixel image generator
pub trait Kernel: Send + Sync {
    /// Colour of pixel `(x, y)` in a `width × height` target, RGBA in `[0, 1]`
    fn shade(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4;
}

impl<K: Kernel + ?Sized> Kernel for &K {
    fn shade(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4 {
        (**self).shade(x, y, width, height)
    }
}

impl<K: Kernel + ?Sized> Kernel for Box<K> {
    fn shade(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4 {
        (**self).shade(x, y, width, height)
    }
}

/// Run `kernel` over every pixel of `target` in parallel
pub fn dispatch<K: Kernel + ?Sized>(kernel: &K, target: &mut PixelGrid) {
    let (width, height) = (target.width(), target.height());
    target
        .pixels_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| shade_row(kernel, row, y as u32, width, height));
}

/// Single-threaded reference dispatch
pub fn dispatch_sequential<K: Kernel + ?Sized>(kernel: &K, target: &mut PixelGrid) {
    let (width, height) = (target.width(), target.height());
    target
        .pixels_mut()
        .chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| shade_row(kernel, row, y as u32, width, height));
}

fn shade_row<K: Kernel + ?Sized>(kernel: &K, row: &mut [[u8; 4]], y: u32, width: u32, height: u32) {
    for (x, pixel) in row.iter_mut().enumerate() {
        *pixel = to_rgba8(kernel.shade(x as u32, y, width, height));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::grid::Extent;

    /// Encodes the pixel coordinate into the colour
    struct Gradient;

    impl Kernel for Gradient {
        fn shade(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4 {
            Vec4::new(x as f32 / width as f32, y as f32 / height as f32, 0.0, 1.0)
        }
    }

    #[test]
    fn dispatch_covers_every_pixel() {
        let mut grid = PixelGrid::new(Extent::new(16, 8)).unwrap();
        dispatch(&Gradient, &mut grid);

        assert!(grid.pixels().iter().all(|px| px[3] == 255));
        assert_eq!(grid.get(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(grid.get(8, 4), Some([127, 127, 0, 255]));
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut parallel = PixelGrid::new(Extent::new(33, 17)).unwrap();
        let mut sequential = parallel.clone();
        dispatch(&Gradient, &mut parallel);
        dispatch_sequential(&Gradient, &mut sequential);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn boxed_kernels_dispatch() {
        let kernel: Box<dyn Kernel> = Box::new(Gradient);
        let mut grid = PixelGrid::new(Extent::new(4, 4)).unwrap();
        dispatch(&kernel, &mut grid);
        assert_eq!(grid.get(2, 2), Some([127, 127, 0, 255]));
    }
}
