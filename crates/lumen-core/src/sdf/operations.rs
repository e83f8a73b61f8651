//! Folding one distance/colour pair into another

use super::{Operation, Sample};
use lumen_math::Color;

// ============================================================================
// Smooth blending
// ============================================================================

/// Quadratic smooth-min of `a` and `b` with blend radius `k`.
///
/// Colours mix with the same weight as the distances. A non-positive `k`
/// degenerates to a hard union.
pub fn blend(a: Sample, b: Sample, k: f32) -> Sample {
    if k <= 0.0 {
        return union(a, b);
    }
    let h = (0.5 + 0.5 * (b.distance - a.distance) / k).clamp(0.0, 1.0);
    let distance = lerp(b.distance, a.distance, h) - k * h * (1.0 - h);
    let colour = Color::lerp(b.colour, a.colour, h);
    Sample::new(colour, distance)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ============================================================================
// Boolean operations
// ============================================================================

fn union(a: Sample, b: Sample) -> Sample {
    if b.distance < a.distance { b } else { a }
}

/// Fold `b` into the accumulated value `a`.
///
/// The branch whose distance wins also supplies the colour; ties keep `a`.
pub fn combine(a: Sample, b: Sample, operation: Operation, blend_strength: f32) -> Sample {
    match operation {
        Operation::Union => union(a, b),
        Operation::SmoothBlend => blend(a, b, blend_strength),
        // max(a, -b)
        Operation::Subtract => {
            if -b.distance > a.distance {
                Sample::new(b.colour, -b.distance)
            } else {
                a
            }
        }
        // max(a, b)
        Operation::Intersect => {
            if b.distance > a.distance { b } else { a }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn red(d: f32) -> Sample {
        Sample::new(Color::RED, d)
    }

    fn blue(d: f32) -> Sample {
        Sample::new(Color::BLUE, d)
    }

    #[test]
    fn union_returns_nearer_with_its_colour() {
        let out = combine(red(2.0), blue(0.5), Operation::Union, 0.0);
        assert_eq!(out, blue(0.5));
        let out = combine(red(0.25), blue(0.5), Operation::Union, 0.0);
        assert_eq!(out, red(0.25));
    }

    #[test]
    fn subtract_carves() {
        // Inside the cutter: -b wins
        let out = combine(red(-1.0), blue(-0.5), Operation::Subtract, 0.0);
        assert_relative_eq!(out.distance, 0.5);
        assert_eq!(out.colour, Color::BLUE);
        // Far from the cutter: a is untouched
        let out = combine(red(1.0), blue(3.0), Operation::Subtract, 0.0);
        assert_eq!(out, red(1.0));
    }

    #[test]
    fn intersect_keeps_farther() {
        let out = combine(red(-0.2), blue(0.3), Operation::Intersect, 0.0);
        assert_eq!(out, blue(0.3));
        let out = combine(red(0.4), blue(0.3), Operation::Intersect, 0.0);
        assert_eq!(out, red(0.4));
    }

    #[test]
    fn smooth_blend_converges_to_union() {
        for (a, b) in [(1.0, 2.0), (2.0, 1.0), (-0.5, 0.75), (0.3, 0.31)] {
            let hard = combine(red(a), blue(b), Operation::Union, 0.0);
            let soft = combine(red(a), blue(b), Operation::SmoothBlend, 1e-4);
            assert_relative_eq!(soft.distance, hard.distance, epsilon = 1e-4);
            assert_eq!(soft.colour, hard.colour);
        }
    }

    #[test]
    fn smooth_blend_rounds_the_seam() {
        // Equal distances meet in the middle and dip below both
        let out = blend(red(1.0), blue(1.0), 0.5);
        assert_relative_eq!(out.distance, 1.0 - 0.5 * 0.25);
        assert_relative_eq!(out.colour.r, 0.5);
        assert_relative_eq!(out.colour.b, 0.5);
    }

    #[test]
    fn zero_strength_blend_is_union() {
        assert_eq!(blend(red(1.0), blue(1.0), 0.0), red(1.0));
        assert_eq!(blend(red(1.0), blue(0.5), 0.0), blue(0.5));
    }
}
