//! Distance functions for the scene primitives
//!
//! Each takes the query point and the primitive's centre; none are rotated.

use glam::{Vec2, Vec3, Vec3Swizzles};

/// Sphere of `radius` around `centre`
pub fn sphere(p: Vec3, centre: Vec3, radius: f32) -> f32 {
    (p - centre).length() - radius
}

/// Axis-aligned box with `half_extents` around `centre`
pub fn cube(p: Vec3, centre: Vec3, half_extents: Vec3) -> f32 {
    let o = (p - centre).abs() - half_extents;
    let outside = o.max(Vec3::ZERO).length();
    let inside = o.x.min(0.0).max(o.y.min(0.0)).max(o.z.min(0.0));
    outside + inside
}

/// Torus lying in the XZ plane
pub fn torus(p: Vec3, centre: Vec3, ring_radius: f32, tube_radius: f32) -> f32 {
    let q = Vec2::new((p - centre).xz().length() - ring_radius, p.y - centre.y);
    q.length() - tube_radius
}
