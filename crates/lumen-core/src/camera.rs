//! Camera, light and primary-ray generation for raymarched scenes

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};
use serde::{Deserialize, Serialize};

/// A ray with a unit-length direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// `direction` is normalized here
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A look-at perspective camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera is looking at
    pub target: Vec3,
    /// Up vector (usually Y-up)
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Width / height, taken from the render target
    #[serde(skip)]
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 6.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn look_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Default::default()
        }
    }

    pub fn with_fov_degrees(mut self, fov_degrees: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// World to camera transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Precompute the inverse transforms used for ray generation
    pub fn rays(&self) -> RayGenerator {
        RayGenerator::new(self.view_matrix().inverse(), self.projection_matrix().inverse())
    }
}

/// Turns normalized device coordinates into world-space rays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayGenerator {
    pub camera_to_world: Mat4,
    pub inverse_projection: Mat4,
}

impl RayGenerator {
    pub fn new(camera_to_world: Mat4, inverse_projection: Mat4) -> Self {
        Self {
            camera_to_world,
            inverse_projection,
        }
    }

    /// Eye position in world space
    pub fn origin(&self) -> Vec3 {
        self.camera_to_world.transform_point3(Vec3::ZERO)
    }

    /// Primary ray through `uv`, both axes in `[-1, 1]` with `+y` up
    pub fn ray(&self, uv: Vec2) -> Ray {
        let view = (self.inverse_projection * Vec4::new(uv.x, uv.y, 0.0, 1.0)).xyz();
        let direction = self.camera_to_world.transform_vector3(view);
        Ray::new(self.origin(), direction)
    }
}

/// Whether [`Light::vector`] is a position or a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightMode {
    /// Point light at `vector`
    #[default]
    Positional,
    /// Parallel light travelling along `vector`
    Directional,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub vector: Vec3,
    pub mode: LightMode,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            vector: Vec3::new(4.0, 6.0, 4.0),
            mode: LightMode::Positional,
        }
    }
}

impl Light {
    pub fn positional(position: Vec3) -> Self {
        Self {
            vector: position,
            mode: LightMode::Positional,
        }
    }

    pub fn directional(direction: Vec3) -> Self {
        Self {
            vector: direction,
            mode: LightMode::Directional,
        }
    }

    /// Unit vector from `from` towards the light
    pub fn direction_from(&self, from: Vec3) -> Vec3 {
        match self.mode {
            LightMode::Positional => (self.vector - from).normalize_or_zero(),
            LightMode::Directional => (-self.vector).normalize_or_zero(),
        }
    }

    /// How far a shadow ray from `from` has to travel; directional lights
    /// use the scene cutoff
    pub fn distance_from(&self, from: Vec3, max_distance: f32) -> f32 {
        match self.mode {
            LightMode::Positional => (from - self.vector).length(),
            LightMode::Directional => max_distance,
        }
    }
}

/// Lambert term for a surface sample, clamped to `[0, 1]`
pub fn lambert(normal: Vec3, to_light: Vec3) -> f32 {
    normal.dot(to_light).clamp(0.0, 1.0)
}
