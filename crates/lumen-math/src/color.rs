//! Colours and palettes

use crate::error::PaletteError;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Linear RGB colour, channels nominally in `[0, 1]` (not enforced)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    /// Default sky behind raymarched scenes
    pub const CORNFLOWER: Self = Self::rgb(0.392, 0.584, 0.929);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Interpolate channel-wise; `t` is clamped to `[0, 1]` first
    pub fn lerp(a: Color, b: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color::rgb(
            a.r + (b.r - a.r) * t,
            a.g + (b.g - a.g) * t,
            a.b + (b.b - a.b) * t,
        )
    }

    /// Four-channel pixel with alpha 1
    pub fn to_rgba(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, 1.0)
    }
}

impl From<Vec3> for Color {
    fn from(v: Vec3) -> Self {
        Self::rgb(v.x, v.y, v.z)
    }
}

impl From<Color> for Vec3 {
    fn from(c: Color) -> Self {
        Vec3::new(c.r, c.g, c.b)
    }
}

/// Ordered, non-empty sequence of colours sampled by a normalized position.
///
/// The unit interval is split into `len` equal buckets. Position `t` falls in
/// bucket `floor(len·t)` and blends towards the next entry (wrapping to the
/// first), so the lookup is continuous across bucket boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Color>", into = "Vec<Color>")]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self { colors })
    }

    /// A palette holding one colour; every lookup returns it
    pub fn solid(color: Color) -> Self {
        Self {
            colors: vec![color],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false, kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Last entry, used as the interior colour of escape-time images
    pub fn last(&self) -> Color {
        self.colors[self.colors.len() - 1]
    }

    /// Sample the palette at `t ∈ [0, 1)`.
    ///
    /// Values at or above 1 land in the final bucket rather than indexing past it.
    pub fn lookup(&self, t: f32) -> Color {
        let len = self.colors.len();
        let scaled = len as f32 * t;
        let index = (scaled.max(0.0) as usize).min(len - 1);
        let next = (index + 1) % len;
        let within = scaled - index as f32;
        Color::lerp(self.colors[index], self.colors[next], within)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![Color::RED, Color::GREEN, Color::BLUE],
        }
    }
}

impl TryFrom<Vec<Color>> for Palette {
    type Error = PaletteError;

    fn try_from(colors: Vec<Color>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<Palette> for Vec<Color> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}
