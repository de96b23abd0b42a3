//! Fixed-step volumetric integration through the displaced density field.

use super::displace::displace_point;
use super::projection::equirect_uv;
use crate::math3d::{smoothstep, Vec3};
use crate::texture::Sampler2D;

/// The density field a ray is marched through: noise map lookups at
/// displaced, spherically projected points.
pub struct VolumeField<'a, N: ?Sized, D: ?Sized> {
    pub noise_map: &'a N,
    pub displacement_map: &'a D,
    pub time: f32,
    pub displacement_strength: f32,
}

impl<N, D> VolumeField<'_, N, D>
where
    N: Sampler2D + ?Sized,
    D: Sampler2D + ?Sized,
{
    #[inline]
    pub fn density_at(&self, p: Vec3) -> f32 {
        let displaced =
            displace_point(p, self.time, self.displacement_strength, self.displacement_map);
        self.noise_map.sample_red(equirect_uv(displaced))
    }
}

/// One iteration of the march, as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchStep {
    pub index: u32,
    pub position: Vec3,
    pub density: f32,
    /// Distance from the sphere centre: 1 at the surface, toward 0 at the core.
    /// Reported only; the mask threshold comes from `cutoff`.
    pub depth_frac: f32,
    pub cutoff: f32,
    pub mask: f32,
}

/// Accumulate volume along `ray_dir` from `ray_origin`.
///
/// `iterations` must be at least 1. The result is not clamped.
#[inline]
pub fn march_volume<N, D>(
    field: &VolumeField<'_, N, D>,
    ray_origin: Vec3,
    ray_dir: Vec3,
    iterations: u32,
    max_depth: f32,
    smoothing: f32,
) -> f32
where
    N: Sampler2D + ?Sized,
    D: Sampler2D + ?Sized,
{
    march_volume_with(field, ray_origin, ray_dir, iterations, max_depth, smoothing, |_| {})
}

/// [`march_volume`] with a callback invoked for every step
pub fn march_volume_with<N, D, F>(
    field: &VolumeField<'_, N, D>,
    ray_origin: Vec3,
    ray_dir: Vec3,
    iterations: u32,
    max_depth: f32,
    smoothing: f32,
    mut observe: F,
) -> f32
where
    N: Sampler2D + ?Sized,
    D: Sampler2D + ?Sized,
    F: FnMut(&MarchStep),
{
    debug_assert!(iterations >= 1, "march needs at least one iteration");

    let per_step = 1.0 / iterations as f32;
    let delta_ray = ray_dir * (per_step * max_depth);

    let mut p = ray_origin;
    let mut total = 0.0;

    for i in 0..iterations {
        let density = field.density_at(p);

        // Deeper slices need denser noise to contribute
        let cutoff = 1.0 - i as f32 * per_step;
        let mask = smoothstep(cutoff, cutoff + smoothing, density);

        observe(&MarchStep {
            index: i,
            position: p,
            density,
            depth_frac: p.length(),
            cutoff,
            mask,
        });

        total += mask * per_step;
        p = p + delta_ray;
    }

    total
}
