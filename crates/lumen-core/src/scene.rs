//! Scene files: camera, light and shape tree loaded from JSON

use crate::camera::{Camera, Light};
use crate::grid::Extent;
use crate::raymarch::{MarchSettings, Raymarcher, SceneKernel};
use crate::sdf::{Operation, Shape, ShapeArena, ShapeNode};
use crate::{Error, Result};
use glam::Vec3;
use lumen_math::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to build a [`SceneKernel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub camera: Camera,
    pub light: Light,
    pub background: Color,
    pub march: MarchSettings,
    pub shapes: Vec<ShapeNode>,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            light: Light::default(),
            background: Color::CORNFLOWER,
            march: MarchSettings::default(),
            shapes: Vec::new(),
        }
    }
}

impl SceneDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let scene = Self::from_json(&json)?;
        tracing::debug!("Loaded scene {} ({} shapes)", path.display(), scene.shapes.len());
        Ok(scene)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// A small built-in scene: a ground slab, a cube with a spherical hole,
    /// and a torus smoothly blended with a sphere
    pub fn demo() -> Self {
        let ground = Shape::cube(Vec3::new(0.0, -1.1, 0.0), Vec3::new(6.0, 0.1, 6.0))
            .with_colour(Color::rgb(0.8, 0.8, 0.8));
        let carved = ShapeNode::new(
            Shape::cube(Vec3::new(-1.5, 0.0, 0.0), Vec3::splat(0.75))
                .with_colour(Color::rgb(0.9, 0.3, 0.2)),
        )
        .with_child(
            Shape::sphere(Vec3::new(-1.5, 0.0, 0.0), 0.95)
                .with_colour(Color::rgb(1.0, 0.8, 0.2))
                .with_operation(Operation::Subtract),
        );
        let blob = ShapeNode::new(
            Shape::torus(Vec3::new(1.5, 0.0, 0.0), 0.8, 0.25).with_colour(Color::rgb(0.2, 0.5, 0.9)),
        )
        .with_child(
            Shape::sphere(Vec3::new(1.5, 0.3, 0.0), 0.45)
                .with_colour(Color::rgb(0.3, 0.9, 0.4))
                .with_operation(Operation::SmoothBlend)
                .with_blend_strength(0.4),
        );

        Self::default()
            .with_camera(Camera::look_at(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO))
            .with_light(Light::positional(Vec3::new(3.0, 5.0, 4.0)))
            .with_shapes(vec![ground.into(), carved, blob])
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.light = light;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_march(mut self, march: MarchSettings) -> Self {
        self.march = march;
        self
    }

    pub fn with_shapes(mut self, shapes: Vec<ShapeNode>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn arena(&self) -> ShapeArena {
        ShapeArena::from_nodes(&self.shapes)
    }

    /// Kernel for a target of `extent`; the camera aspect follows the target
    pub fn kernel(&self, extent: Extent) -> Result<SceneKernel> {
        if extent.is_empty() {
            return Err(Error::InvalidDimensions {
                width: extent.width,
                height: extent.height,
            });
        }
        let camera = self.camera.clone().with_aspect(extent.aspect());
        let marcher = Raymarcher::new(self.arena(), self.march);
        Ok(SceneKernel::new(marcher, camera.rays(), self.light).with_background(self.background))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::camera::LightMode;
    use crate::sdf::ShapeType;

    #[test]
    fn minimal_json_uses_defaults() {
        let scene = SceneDescription::from_json("{}").unwrap();
        assert_eq!(scene, SceneDescription::default());
        assert!(scene.arena().is_empty());
    }

    #[test]
    fn parses_full_scene() {
        let json = r#"{
            "camera": { "position": [0.0, 0.0, 4.0], "target": [0.0, 0.0, 0.0], "fov_degrees": 45.0 },
            "light": { "vector": [0.0, -1.0, 0.0], "mode": "directional" },
            "background": { "r": 0.0, "g": 0.0, "b": 0.0 },
            "march": { "max_distance": 40.0 },
            "shapes": [
                { "shape_type": "torus", "size": [1.0, 0.2, 0.0],
                  "children": [ { "shape_type": "cube", "operation": "intersect" } ] },
                { "shape_type": "sphere", "position": [2.0, 0.0, 0.0] }
            ]
        }"#;
        let scene = SceneDescription::from_json(json).unwrap();
        assert_eq!(scene.light.mode, LightMode::Directional);
        assert_eq!(scene.background, Color::BLACK);
        assert!((scene.march.max_distance - 40.0).abs() < f32::EPSILON);
        assert!((scene.march.epsilon - 0.001).abs() < f32::EPSILON);

        let arena = scene.arena();
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.groups().len(), 2);
        assert_eq!(arena.shapes()[0].shape_type, ShapeType::Torus);
        assert_eq!(arena.shapes()[1].operation, Operation::Intersect);
    }

    #[test]
    fn bad_json_is_an_error() {
        let err = SceneDescription::from_json(r#"{ "shapes": [ { "shape_type": "cone" } ] }"#);
        assert!(matches!(err, Err(Error::Json(_))));
    }

    #[test]
    fn demo_round_trips_through_json() {
        let demo = SceneDescription::demo();
        let parsed = SceneDescription::from_json(&demo.to_json().unwrap()).unwrap();
        assert_eq!(parsed.shapes, demo.shapes);
        assert!(demo.kernel(Extent::new(0, 4)).is_err());
        assert!(demo.kernel(Extent::new(4, 4)).is_ok());
    }
}
