//! Signed distance scene description
//!
//! A scene is a flat list of top-level [`Shape`]s, each of which may own a run
//! of child shapes. Children are folded into their parent first, each with its
//! own operation and blend strength; the parent's result is then folded into
//! the running scene value with the parent's operation.
//!
//! Distances are negative inside a shape, positive outside and zero on the
//! surface.

pub mod arena;
pub mod operations;
pub mod primitives;

pub use arena::{Group, ShapeArena};
pub use operations::{blend, combine};

use glam::Vec3;
use lumen_math::Color;
use serde::{Deserialize, Serialize};

/// Primitive a [`Shape`] evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    /// Radius in `size.x`
    #[default]
    Sphere,
    /// Half-extents in `size`
    Cube,
    /// Ring radius in `size.x`, tube radius in `size.y`
    Torus,
}

/// How a shape's distance merges with the value it is folded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Nearer surface wins
    #[default]
    Union,
    /// Quadratic smooth-min with `k = blend_strength`
    SmoothBlend,
    /// Carve this shape out of the accumulated value
    Subtract,
    /// Keep only the overlap
    Intersect,
}

/// A positioned, coloured primitive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shape {
    pub position: Vec3,
    pub size: Vec3,
    pub colour: Color,
    pub shape_type: ShapeType,
    pub operation: Operation,
    pub blend_strength: f32,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            size: Vec3::ONE,
            colour: Color::WHITE,
            shape_type: ShapeType::Sphere,
            operation: Operation::Union,
            blend_strength: 0.0,
        }
    }
}

impl Shape {
    pub fn sphere(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            size: Vec3::splat(radius),
            shape_type: ShapeType::Sphere,
            ..Self::default()
        }
    }

    pub fn cube(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            position,
            size: half_extents,
            shape_type: ShapeType::Cube,
            ..Self::default()
        }
    }

    pub fn torus(position: Vec3, ring_radius: f32, tube_radius: f32) -> Self {
        Self {
            position,
            size: Vec3::new(ring_radius, tube_radius, 0.0),
            shape_type: ShapeType::Torus,
            ..Self::default()
        }
    }

    pub fn with_colour(mut self, colour: Color) -> Self {
        self.colour = colour;
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_blend_strength(mut self, blend_strength: f32) -> Self {
        self.blend_strength = blend_strength;
        self
    }

    /// Signed distance from `p` to this shape's surface
    pub fn distance(&self, p: Vec3) -> f32 {
        match self.shape_type {
            ShapeType::Sphere => primitives::sphere(p, self.position, self.size.x),
            ShapeType::Cube => primitives::cube(p, self.position, self.size),
            ShapeType::Torus => primitives::torus(p, self.position, self.size.x, self.size.y),
        }
    }
}

/// A top-level shape with its children, as written in scene files.
///
/// Children cannot have children of their own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeNode {
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Shape>,
}

impl ShapeNode {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Shape) -> Self {
        self.children.push(child);
        self
    }
}

impl From<Shape> for ShapeNode {
    fn from(shape: Shape) -> Self {
        Self::new(shape)
    }
}

/// Colour and distance of the scene at one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub colour: Color,
    pub distance: f32,
}

impl Sample {
    pub const fn new(colour: Color, distance: f32) -> Self {
        Self { colour, distance }
    }
}
