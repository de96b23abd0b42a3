//! Equirectangular (longitude/latitude) mapping between directions and UV.

use std::f32::consts::{PI, TAU};

use crate::math3d::{Vec2, Vec3};

/// Map a direction to equirectangular UV in [0, 1]².
///
/// `p` need not be unit length. The zero vector has no direction and must
/// not be passed in. `u` is ill-conditioned at the poles.
#[inline]
pub fn equirect_uv(p: Vec3) -> Vec2 {
    let n = p.normalize();
    let u = 0.5 - n.z.atan2(n.x) / TAU;
    // Rounding can push |y| a hair past 1 after normalisation
    let v = 0.5 + n.y.clamp(-1.0, 1.0).asin() / PI;
    Vec2::new(u, v)
}

/// Inverse of [`equirect_uv`]: the unit direction for a UV coordinate
#[cfg(test)]
pub fn equirect_direction(uv: Vec2) -> Vec3 {
    let lon = (0.5 - uv.x) * TAU;
    let lat = (uv.y - 0.5) * PI;
    let cos_lat = lat.cos();
    Vec3::new(cos_lat * lon.cos(), lat.sin(), cos_lat * lon.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere_directions() -> Vec<Vec3> {
        let mut dirs = Vec::new();
        for i in 0..24 {
            for j in 0..12 {
                let theta = i as f32 / 24.0 * TAU;
                let phi = (j as f32 + 0.5) / 12.0 * PI - PI / 2.0;
                dirs.push(Vec3::new(
                    phi.cos() * theta.cos(),
                    phi.sin(),
                    phi.cos() * theta.sin(),
                ));
            }
        }
        dirs.push(Vec3::new(0.0, 1.0, 0.0));
        dirs.push(Vec3::new(0.0, -1.0, 0.0));
        dirs.push(Vec3::new(-1.0, 0.0, 0.0));
        dirs
    }

    #[test]
    fn test_uv_in_unit_square() {
        for d in sphere_directions() {
            let uv = equirect_uv(d);
            assert!((0.0..=1.0).contains(&uv.x), "u out of range for {d:?}: {}", uv.x);
            assert!((0.0..=1.0).contains(&uv.y), "v out of range for {d:?}: {}", uv.y);
        }
    }

    #[test]
    fn test_unnormalised_input_matches_unit_input() {
        let d = Vec3::new(0.3, -0.4, 0.5);
        assert!(equirect_uv(d * 7.5).approx_eq(&equirect_uv(d.normalize()), 1e-6));
    }

    #[test]
    fn test_known_directions() {
        // +X sits on the centre meridian, +Y on the top edge
        assert!(equirect_uv(Vec3::new(1.0, 0.0, 0.0)).approx_eq(&Vec2::new(0.5, 0.5), 1e-6));
        assert!((equirect_uv(Vec3::new(0.0, 1.0, 0.0)).y - 1.0).abs() < 1e-6);
        assert!(equirect_uv(Vec3::new(0.0, -1.0, 0.0)).y.abs() < 1e-6);
        assert!(equirect_uv(Vec3::new(0.0, 0.0, 1.0)).approx_eq(&Vec2::new(0.25, 0.5), 1e-6));
    }

    #[test]
    fn test_round_trip_away_from_seam_and_poles() {
        for i in 1..20 {
            for j in 1..10 {
                let uv = Vec2::new(i as f32 / 20.0, j as f32 / 10.0);
                let back = equirect_uv(equirect_direction(uv));
                assert!(back.approx_eq(&uv, 1e-4), "{uv:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn test_inverse_is_unit_length() {
        let d = equirect_direction(Vec2::new(0.13, 0.77));
        assert!((d.length() - 1.0).abs() < 1e-6);
    }
}
