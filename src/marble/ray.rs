//! View-ray construction for a fragment on the unit sphere.

use crate::math3d::{lerp, Vec3};

/// Per-fragment inputs, in the sphere's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentContext {
    /// Fragment position on the unit sphere
    pub local_position: Vec3,
    /// Camera-to-fragment direction, not necessarily normalised
    pub view_direction_local: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Bend the view direction toward the inward surface normal by `refraction`
#[inline]
pub fn build_view_ray(frag: &FragmentContext, refraction: f32) -> ViewRay {
    let origin = frag.local_position.normalize();
    let inward = -origin;
    let raw_dir = frag.view_direction_local.normalize();
    ViewRay {
        origin,
        direction: lerp(raw_dir, inward, refraction).normalize(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag() -> FragmentContext {
        FragmentContext {
            local_position: Vec3::new(0.3, 0.5, 0.81),
            view_direction_local: Vec3::new(0.3, 0.5, -1.19),
        }
    }

    #[test]
    fn test_origin_projected_onto_sphere() {
        let ray = build_view_ray(&frag(), 0.0);
        assert!((ray.origin.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_refraction_keeps_view_direction() {
        let f = frag();
        let ray = build_view_ray(&f, 0.0);
        assert!(ray.direction.approx_eq(&f.view_direction_local.normalize(), 1e-6));
    }

    #[test]
    fn test_full_refraction_points_at_core() {
        let f = frag();
        let ray = build_view_ray(&f, 1.0);
        assert!(ray.direction.approx_eq(&-f.local_position.normalize(), 1e-6));
    }

    #[test]
    fn test_partial_refraction_is_between() {
        let f = frag();
        let view = f.view_direction_local.normalize();
        let inward = -f.local_position.normalize();
        let ray = build_view_ray(&f, 0.5);
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!(ray.direction.dot(&inward) > view.dot(&inward));
    }
}
