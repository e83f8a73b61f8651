//! Flat shape storage with explicit parent → children ranges

use super::{Sample, Shape, ShapeNode, combine};
use crate::{Error, Result};
use glam::Vec3;
use lumen_math::Color;
use std::ops::Range;

/// One top-level shape and the index range of its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub parent: usize,
    pub children: Range<usize>,
}

/// All shapes of a scene, stored parent-first.
///
/// Every group's child range is checked when it is added, so evaluation never
/// reads past the end of the shape list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeArena {
    shapes: Vec<Shape>,
    groups: Vec<Group>,
}

impl ShapeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level shape followed by its children
    pub fn push(&mut self, parent: Shape, children: impl IntoIterator<Item = Shape>) -> &mut Self {
        let parent_index = self.shapes.len();
        self.shapes.push(parent);
        self.shapes.extend(children);
        self.groups.push(Group {
            parent: parent_index,
            children: parent_index + 1..self.shapes.len(),
        });
        self
    }

    /// Build from nested scene-file nodes
    pub fn from_nodes(nodes: &[ShapeNode]) -> Self {
        let mut arena = Self::new();
        for node in nodes {
            arena.push(node.shape, node.children.iter().copied());
        }
        arena
    }

    /// Build from a flat list where each shape carries the number of shapes
    /// immediately after it that are its children.
    ///
    /// Fails when a count runs past the end of the list.
    pub fn from_run_lengths(flat: &[(Shape, usize)]) -> Result<Self> {
        let mut arena = Self::new();
        let mut i = 0;
        while i < flat.len() {
            let (parent, count) = flat[i];
            let end = i + 1 + count;
            if end > flat.len() {
                return Err(Error::InvalidShapeTree(format!(
                    "shape {i} claims {count} children but only {} shapes follow it",
                    flat.len() - i - 1
                )));
            }
            arena.push(parent, flat[i + 1..end].iter().map(|(child, _)| *child));
            i = end;
        }
        Ok(arena)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of stored shapes, children included
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Colour and distance of the nearest surface at `p`.
    ///
    /// Starts from `(white, max_distance)`, so an empty scene reports the
    /// cutoff distance everywhere.
    pub fn evaluate(&self, p: Vec3, max_distance: f32) -> Sample {
        let mut global = Sample::new(Color::WHITE, max_distance);
        for group in &self.groups {
            let parent = &self.shapes[group.parent];
            let mut local = Sample::new(parent.colour, parent.distance(p));
            for child in &self.shapes[group.children.clone()] {
                let sample = Sample::new(child.colour, child.distance(p));
                local = combine(local, sample, child.operation, child.blend_strength);
            }
            global = combine(global, local, parent.operation, parent.blend_strength);
        }
        global
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sdf::Operation;
    use approx::assert_relative_eq;

    #[test]
    fn run_lengths_are_validated() {
        let sphere = Shape::sphere(Vec3::ZERO, 1.0);
        let ok = ShapeArena::from_run_lengths(&[(sphere, 1), (sphere, 0), (sphere, 0)]).unwrap();
        assert_eq!(ok.len(), 3);
        assert_eq!(ok.groups().len(), 2);
        assert_eq!(ok.groups()[0].children, 1..2);
        assert_eq!(ok.groups()[1].children, 3..3);

        let err = ShapeArena::from_run_lengths(&[(sphere, 0), (sphere, 2), (sphere, 0)]);
        assert!(matches!(err, Err(Error::InvalidShapeTree(_))));
    }

    #[test]
    fn empty_scene_reports_cutoff() {
        let sample = ShapeArena::new().evaluate(Vec3::ONE, 80.0);
        assert_relative_eq!(sample.distance, 80.0);
        assert_eq!(sample.colour, Color::WHITE);
    }

    #[test]
    fn nearest_top_level_shape_wins() {
        let mut arena = ShapeArena::new();
        arena
            .push(Shape::sphere(Vec3::new(-3.0, 0.0, 0.0), 1.0).with_colour(Color::RED), [])
            .push(Shape::sphere(Vec3::new(3.0, 0.0, 0.0), 1.0).with_colour(Color::BLUE), []);

        let left = arena.evaluate(Vec3::new(-1.0, 0.0, 0.0), 80.0);
        assert_relative_eq!(left.distance, 1.0);
        assert_eq!(left.colour, Color::RED);

        let right = arena.evaluate(Vec3::new(1.5, 0.0, 0.0), 80.0);
        assert_relative_eq!(right.distance, 0.5);
        assert_eq!(right.colour, Color::BLUE);
    }

    #[test]
    fn children_use_their_own_operation() {
        // Cube with a sphere carved out of its centre
        let cube = Shape::cube(Vec3::ZERO, Vec3::ONE).with_colour(Color::RED);
        let hole = Shape::sphere(Vec3::ZERO, 0.5)
            .with_colour(Color::GREEN)
            .with_operation(Operation::Subtract);
        let node = ShapeNode::new(cube).with_child(hole);
        let arena = ShapeArena::from_nodes(&[node]);

        // Centre of the cube is now outside the solid by the hole radius
        let centre = arena.evaluate(Vec3::ZERO, 80.0);
        assert_relative_eq!(centre.distance, 0.5);
        assert_eq!(centre.colour, Color::GREEN);

        // Deep in the cube wall the cube still rules
        let wall = arena.evaluate(Vec3::new(0.8, 0.0, 0.0), 80.0);
        assert_relative_eq!(wall.distance, -0.2, epsilon = 1e-6);
        assert_eq!(wall.colour, Color::RED);
    }
}
