//! The marble material: parameters plus the two texture maps it samples.

use super::march::{march_volume, march_volume_with, MarchStep, VolumeField};
use super::params::RenderParameters;
use super::ray::{build_view_ray, FragmentContext};
use super::resolve::{resolve_color, Rgba};
use crate::texture::{Sampler2D, Texture};

/// One material bound to one sphere. Owns its uniform block exclusively.
pub struct MarbleMaterial<N = Texture, D = Texture> {
    params: RenderParameters,
    noise_map: N,
    displacement_map: D,
}

impl<N: Sampler2D, D: Sampler2D> MarbleMaterial<N, D> {
    pub fn new(params: RenderParameters, noise_map: N, displacement_map: D) -> Self {
        Self {
            params,
            noise_map,
            displacement_map,
        }
    }

    #[inline]
    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    /// Mutable access for the per-frame update; must not overlap shading
    #[inline]
    pub fn params_mut(&mut self) -> &mut RenderParameters {
        &mut self.params
    }

    /// Shade one fragment of the sphere
    #[inline]
    pub fn compute_surface_color(&self, frag: &FragmentContext) -> Rgba {
        let t = self.params.tunables();
        let ray = build_view_ray(frag, t.refraction);
        let c = march_volume(
            &self.field(),
            ray.origin,
            ray.direction,
            t.iterations,
            t.max_depth,
            t.smoothing,
        );
        resolve_color(c, self.params.color_a, self.params.color_b, self.params.opacity)
    }

    /// Every march step behind one fragment's colour, for diagnostics
    pub fn trace(&self, frag: &FragmentContext) -> Vec<MarchStep> {
        let t = self.params.tunables();
        let ray = build_view_ray(frag, t.refraction);
        let mut steps = Vec::with_capacity(t.iterations as usize);
        march_volume_with(
            &self.field(),
            ray.origin,
            ray.direction,
            t.iterations,
            t.max_depth,
            t.smoothing,
            |step| steps.push(*step),
        );
        steps
    }

    /// The density field as seen with this frame's time and strength
    pub fn field(&self) -> VolumeField<'_, N, D> {
        VolumeField {
            noise_map: &self.noise_map,
            displacement_map: &self.displacement_map,
            time: self.params.time,
            displacement_strength: self.params.tunables().displacement_strength,
        }
    }
}
