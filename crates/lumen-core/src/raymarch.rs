//! Sphere tracing, lighting and the scene kernel
//!
//! Rays advance by the scene's distance bound until they come within
//! `epsilon` of a surface or travel past `max_distance`. Hits are lit with a
//! Lambert term and a soft shadow traced towards the light.

use crate::camera::{Light, Ray, RayGenerator, lambert};
use crate::kernel::Kernel;
use crate::sdf::{Sample, ShapeArena};
use glam::{Vec2, Vec3, Vec4};
use lumen_math::{Color, map};
use serde::{Deserialize, Serialize};

/// Tunables of the march and the shadow pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarchSettings {
    /// Rays that travel further than this miss
    pub max_distance: f32,
    /// Surface hit threshold, also the normal-estimation step
    pub epsilon: f32,
    /// Offset along the normal before tracing a shadow ray
    pub shadow_bias: f32,
    /// Brightness of fully shadowed points
    pub shadow_floor: f32,
    /// Penumbra sharpness: larger values give harder shadow edges
    pub penumbra: f32,
    /// Hard cap on march iterations per ray
    pub max_steps: u32,
}

impl Default for MarchSettings {
    fn default() -> Self {
        let epsilon = 0.001;
        Self {
            max_distance: 80.0,
            epsilon,
            shadow_bias: epsilon * 50.0,
            shadow_floor: 0.2,
            penumbra: 200.0,
            max_steps: 512,
        }
    }
}

impl MarchSettings {
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Where and how a ray met a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Vec3,
    /// Distance along the ray from its origin to `point`
    pub distance_travelled: f32,
    /// March iterations spent
    pub steps: u32,
    /// Unlit surface colour
    pub colour: Color,
}

/// Sphere tracer over a [`ShapeArena`]
#[derive(Debug, Clone)]
pub struct Raymarcher {
    arena: ShapeArena,
    settings: MarchSettings,
}

impl Raymarcher {
    pub fn new(arena: ShapeArena, settings: MarchSettings) -> Self {
        Self { arena, settings }
    }

    pub fn arena(&self) -> &ShapeArena {
        &self.arena
    }

    pub fn settings(&self) -> &MarchSettings {
        &self.settings
    }

    /// Scene colour and distance at `p`
    pub fn sample(&self, p: Vec3) -> Sample {
        self.arena.evaluate(p, self.settings.max_distance)
    }

    /// Trace `ray` to the first surface within range
    pub fn march(&self, ray: Ray) -> Option<Hit> {
        let mut origin = ray.origin;
        let mut travelled = 0.0;
        let mut steps = 0;
        while travelled < self.settings.max_distance && steps < self.settings.max_steps {
            steps += 1;
            let sample = self.sample(origin);
            if sample.distance <= self.settings.epsilon {
                return Some(Hit {
                    point: origin + ray.direction * sample.distance,
                    distance_travelled: travelled + sample.distance,
                    steps,
                    colour: sample.colour,
                });
            }
            origin += ray.direction * sample.distance;
            travelled += sample.distance;
        }
        None
    }

    /// Surface normal at `p` by central differences
    pub fn normal(&self, p: Vec3) -> Vec3 {
        let e = self.settings.epsilon;
        let d = |offset: Vec3| self.sample(p + offset).distance - self.sample(p - offset).distance;
        Vec3::new(d(Vec3::X * e), d(Vec3::Y * e), d(Vec3::Z * e)).normalize_or_zero()
    }

    /// Soft shadow factor along `ray` over `distance`, in `[shadow_floor, 1]`
    pub fn shadow(&self, ray: Ray, distance: f32) -> f32 {
        let floor = self.settings.shadow_floor;
        let mut origin = ray.origin;
        let mut travelled = 0.0;
        let mut brightness: f32 = 1.0;
        let mut steps = 0;
        while travelled < distance && steps < self.settings.max_steps {
            steps += 1;
            let d = self.sample(origin).distance;
            if d <= self.settings.epsilon {
                return floor;
            }
            brightness = brightness.min(d * self.settings.penumbra);
            origin += ray.direction * d;
            travelled += d;
        }
        floor + (1.0 - floor) * brightness
    }

    /// Lit colour seen along `ray`, or `None` when it escapes
    pub fn shade(&self, ray: Ray, light: &Light) -> Option<Color> {
        let hit = self.march(ray)?;
        let normal = self.normal(hit.point - ray.direction * self.settings.epsilon);
        let diffuse = lambert(normal, light.direction_from(hit.point));

        let offset = hit.point + normal * self.settings.shadow_bias;
        let shadow_ray = Ray::new(offset, light.direction_from(offset));
        let shadow = self.shadow(
            shadow_ray,
            light.distance_from(offset, self.settings.max_distance),
        );

        let factor = diffuse * shadow;
        let c = hit.colour;
        Some(Color::rgb(c.r * factor, c.g * factor, c.b * factor))
    }
}

/// Per-pixel raymarching kernel
#[derive(Debug, Clone)]
pub struct SceneKernel {
    marcher: Raymarcher,
    rays: RayGenerator,
    light: Light,
    background: Color,
}

impl SceneKernel {
    pub fn new(marcher: Raymarcher, rays: RayGenerator, light: Light) -> Self {
        Self {
            marcher,
            rays,
            light,
            background: Color::CORNFLOWER,
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn marcher(&self) -> &Raymarcher {
        &self.marcher
    }

    /// Normalized device coordinate of a pixel, `+y` up
    pub fn uv(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
        Vec2::new(
            map(x as f32, width as f32, -1.0, 1.0),
            map(y as f32, height as f32, 1.0, -1.0),
        )
    }
}

impl Kernel for SceneKernel {
    fn shade(&self, x: u32, y: u32, width: u32, height: u32) -> Vec4 {
        let ray = self.rays.ray(Self::uv(x, y, width, height));
        self.marcher
            .shade(ray, &self.light)
            .unwrap_or(self.background)
            .to_rgba()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::sdf::Shape;
    use approx::assert_relative_eq;

    fn single_sphere(radius: f32) -> Raymarcher {
        let mut arena = ShapeArena::new();
        arena.push(Shape::sphere(Vec3::ZERO, radius), []);
        Raymarcher::new(arena, MarchSettings::default())
    }

    #[test]
    fn sphere_hit_distance() {
        let (radius, distance) = (1.0, 5.0);
        let marcher = single_sphere(radius);
        let camera = Camera::look_at(Vec3::new(0.0, 0.0, distance), Vec3::ZERO);
        let hit = marcher.march(camera.rays().ray(Vec2::ZERO)).unwrap();

        let eps = marcher.settings().epsilon;
        assert_relative_eq!(hit.distance_travelled, distance - radius, epsilon = eps);
        assert_relative_eq!(hit.point.z, radius, epsilon = eps);
        assert!(hit.steps <= 3);
    }

    #[test]
    fn miss_returns_none() {
        let marcher = single_sphere(1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(marcher.march(ray).is_none());
    }

    #[test]
    fn step_cap_stops_grazing_rays() {
        let mut arena = ShapeArena::new();
        arena.push(Shape::sphere(Vec3::ZERO, 1.0), []);
        let marcher = Raymarcher::new(arena, MarchSettings::default().with_max_steps(1));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        assert!(marcher.march(ray).is_none());
    }

    #[test]
    fn normal_points_outward() {
        let marcher = single_sphere(1.0);
        let n = marcher.normal(Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn occluded_point_gets_shadow_floor() {
        let mut arena = ShapeArena::new();
        arena.push(Shape::sphere(Vec3::new(0.0, 3.0, 0.0), 1.0), []);
        let marcher = Raymarcher::new(arena, MarchSettings::default());
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        assert_relative_eq!(marcher.shadow(ray, 10.0), 0.2);
        // Unobstructed direction stays fully lit
        let clear = Ray::new(Vec3::ZERO, -Vec3::Y);
        assert_relative_eq!(marcher.shadow(clear, 10.0), 1.0);
    }

    #[test]
    fn background_fills_misses() {
        let kernel = SceneKernel::new(
            Raymarcher::new(ShapeArena::new(), MarchSettings::default()),
            Camera::default().rays(),
            Light::default(),
        );
        let px = kernel.shade(3, 4, 8, 8);
        assert_eq!(px, Color::CORNFLOWER.to_rgba());
    }

    #[test]
    fn uv_corners() {
        assert_eq!(SceneKernel::uv(0, 0, 10, 10), Vec2::new(-1.0, 1.0));
        assert_eq!(SceneKernel::uv(5, 5, 10, 10), Vec2::ZERO);
    }
}
