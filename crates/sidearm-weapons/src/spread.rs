//! Mapping from a 2D sample to a projectile's aim offset.

use glam::{Vec2, Vec3};

/// 137.5 degrees in radians. Successive points rotated by this angle never
/// line up, which keeps a sunflower pattern evenly filled.
const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Per-axis interpolation between `min` and `max`, using each component of
/// `sample` as the factor. Factors are clamped to `[0, 1]`, so the
/// negative half of a unit-disk sample collapses onto `min`.
pub fn spread_offset(sample: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    Vec2::new(
        lerp(min.x, max.x, sample.x.clamp(0.0, 1.0)),
        lerp(min.y, max.y, sample.y.clamp(0.0, 1.0)),
    )
}

/// Point `index` of `count` spread evenly over the unit disk.
pub fn unified_sample(index: u32, count: u32) -> Vec2 {
    let count = count.max(1) as f32;
    let radius = ((index as f32 + 0.5) / count).sqrt();
    let theta = index as f32 * GOLDEN_ANGLE;
    Vec2::new(radius * theta.cos(), radius * theta.sin())
}

/// Aim point in the shooter's local frame: the offset on the X/Y plane,
/// `max_range` down +Z.
pub fn local_aim(offset: Vec2, max_range: f32) -> Vec3 {
    Vec3::new(offset.x, offset.y, max_range)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_center_maps_to_min() {
        let offset = spread_offset(Vec2::ZERO, Vec2::splat(-1.0), Vec2::splat(1.0));
        assert_eq!(offset, Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn full_sample_maps_to_max() {
        let offset = spread_offset(Vec2::ONE, Vec2::new(-2.0, 0.0), Vec2::new(2.0, 4.0));
        assert_eq!(offset, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn negative_factors_clamp_to_min() {
        let offset = spread_offset(
            Vec2::new(-0.8, 0.5),
            Vec2::splat(-1.0),
            Vec2::splat(1.0),
        );
        assert_eq!(offset, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn local_aim_points_down_z() {
        assert_eq!(
            local_aim(Vec2::new(0.25, -0.5), 40.0),
            Vec3::new(0.25, -0.5, 40.0)
        );
    }

    #[test]
    fn unified_samples_are_distinct() {
        let points: Vec<Vec2> = (0..8).map(|i| unified_sample(i, 8)).collect();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!(a.distance(*b) > 1e-3, "{a:?} and {b:?} overlap");
            }
        }
    }

    #[test]
    fn unified_sample_is_deterministic() {
        assert_eq!(unified_sample(3, 5), unified_sample(3, 5));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn offset_within_bounds(
                sx in -1.0f32..=1.0,
                sy in -1.0f32..=1.0,
                lo_x in -10.0f32..0.0,
                lo_y in -10.0f32..0.0,
                w in 0.0f32..10.0,
                h in 0.0f32..10.0,
            ) {
                let min = Vec2::new(lo_x, lo_y);
                let max = min + Vec2::new(w, h);
                let o = spread_offset(Vec2::new(sx, sy), min, max);
                prop_assert!(o.x >= min.x - 1e-4 && o.x <= max.x + 1e-4);
                prop_assert!(o.y >= min.y - 1e-4 && o.y <= max.y + 1e-4);
            }

            #[test]
            fn unified_samples_inside_disk(count in 1u32..64, index in 0u32..64) {
                let index = index % count;
                prop_assert!(unified_sample(index, count).length() <= 1.0 + 1e-5);
            }
        }
    }
}
