//! Collision and mass laws.
//!
//! This module holds the pure math the simulation step is built on:
//! - the mass/radius relation
//! - the mass-dependent movement speed
//! - the consumption rules (blob-food and blob-blob)

use glam::Vec2;

/// Mass = radius² / 100, so radius = sqrt(100 · mass).
pub const MASS_CONVERSION: f32 = 100.0;

/// Radius as a monotonic increasing function of mass.
#[inline]
pub fn radius_for_mass(mass: f32) -> f32 {
    (MASS_CONVERSION * mass).sqrt()
}

/// Per-tick movement speed; heavier blobs move slower.
///
/// `speed_scale` of 30 is the reference speed.
#[inline]
pub fn speed_for_mass(mass: f32, speed_scale: f32) -> f32 {
    let base = 2.2 * radius_for_mass(mass).powf(-0.439) * 40.0;
    base * (speed_scale / 30.0)
}

/// Blob-food rule: a pellet is consumed once its position lies strictly
/// inside the blob's radius.
#[inline]
pub fn covers(blob_pos: Vec2, blob_radius: f32, point: Vec2) -> bool {
    blob_pos.distance_squared(point) < blob_radius * blob_radius
}

/// Blob-blob rule: consumption requires both a mass advantage and real
/// overlap depth.
///
/// The attacker must outweigh the target by `mass_ratio`, and the centers
/// must be closer than `attacker_radius - target_radius / depth_div`.
/// Near-equal pairs fail the ratio check and never resolve, so ties are
/// impossible by construction.
#[inline]
pub fn consumes(
    attacker_pos: Vec2,
    attacker_mass: f32,
    target_pos: Vec2,
    target_mass: f32,
    mass_ratio: f32,
    depth_div: f32,
) -> bool {
    if attacker_mass < mass_ratio * target_mass {
        return false;
    }
    let depth = radius_for_mass(attacker_mass) - radius_for_mass(target_mass) / depth_div;
    if depth <= 0.0 {
        return false;
    }
    attacker_pos.distance_squared(target_pos) < depth * depth
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_is_monotonic_in_mass() {
        let mut last = 0.0;
        for mass in [1.0_f32, 5.0, 10.0, 50.0, 100.0, 1000.0] {
            let r = radius_for_mass(mass);
            assert!(r > last);
            last = r;
        }
    }

    #[test]
    fn test_heavier_blobs_are_slower() {
        assert!(speed_for_mass(10.0, 30.0) > speed_for_mass(100.0, 30.0));
        assert!(speed_for_mass(100.0, 30.0) > speed_for_mass(1000.0, 30.0));
    }

    #[test]
    fn test_covers_pellet() {
        let blob = Vec2::ZERO;
        let r = radius_for_mass(10.0);
        assert!(covers(blob, r, Vec2::new(r / 2.0, 0.0)));
        assert!(!covers(blob, r, Vec2::new(r * 2.0, 0.0)));
    }

    #[test]
    fn test_consumes_with_clear_advantage() {
        // 100 vs 50 at the same point: ratio 2.0 over a 1.2 threshold.
        assert!(consumes(Vec2::ZERO, 100.0, Vec2::ZERO, 50.0, 1.2, 3.0));
    }

    #[test]
    fn test_equal_mass_never_consumes() {
        assert!(!consumes(Vec2::ZERO, 80.0, Vec2::ZERO, 80.0, 1.2, 3.0));
    }

    #[test]
    fn test_ratio_below_threshold_never_consumes() {
        // 55 vs 50 overlap fully but 1.1 < 1.2.
        assert!(!consumes(Vec2::ZERO, 55.0, Vec2::ZERO, 50.0, 1.2, 3.0));
    }

    #[test]
    fn test_shallow_overlap_never_consumes() {
        // Heavy attacker, but the target is barely touching its rim.
        let attacker_r = radius_for_mass(100.0);
        let target = Vec2::new(attacker_r, 0.0);
        assert!(!consumes(Vec2::ZERO, 100.0, target, 50.0, 1.2, 3.0));
    }
}
