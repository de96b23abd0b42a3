//! Software rasterisation of the marble sphere.
//!
//! Every pixel casts a camera ray, moves it into the sphere's local space
//! through `world_to_local`, and intersects the unit sphere there. A hit
//! becomes a [`FragmentContext`] for the material; a miss shows the
//! palette background. Rows are shaded in parallel; the material and its
//! parameters are only read during the pass.

use rayon::prelude::*;

use crate::display::{blend_pixel_into, write_pixel, PixelBuffer};
use crate::marble::{FragmentContext, MarbleMaterial, MarchStep, RenderParameters, Rgba};
use crate::math3d::Vec3;
use crate::palette::Hsl;
use crate::texture::Sampler2D;

/// Pinhole camera orientation in world space. The ray origin lives in
/// [`RenderParameters::camera_local`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    /// tan(fov_y / 2)
    half_height: f32,
}

impl Camera {
    /// Camera at `position` aimed at `target`, vertical field of view in degrees
    pub fn look_at(position: Vec3, target: Vec3, fov_y_degrees: f32) -> Self {
        let forward = (target - position).normalize();
        let mut right = forward.cross(&Vec3::new(0.0, 1.0, 0.0)).normalize();
        if right == Vec3::zero() {
            // Looking straight up or down
            right = Vec3::new(1.0, 0.0, 0.0);
        }
        let up = right.cross(&forward);
        Self {
            forward,
            right,
            up,
            half_height: (fov_y_degrees.to_radians() * 0.5).tan(),
        }
    }

    /// World-space direction through the centre of pixel (px, py), unnormalised
    #[inline]
    pub fn primary_ray(&self, px: f32, py: f32, width: u32, height: u32) -> Vec3 {
        let aspect = width as f32 / height.max(1) as f32;
        let sx = (2.0 * (px + 0.5) / width as f32 - 1.0) * aspect * self.half_height;
        let sy = (1.0 - 2.0 * (py + 0.5) / height as f32) * self.half_height;
        self.forward + self.right * sx + self.up * sy
    }
}

/// Nearest front-facing hit of `origin + t * dir` with the unit sphere.
/// `dir` need not be normalised; the returned `t` is in its units.
#[inline]
pub fn intersect_unit_sphere(origin: Vec3, dir: Vec3) -> Option<f32> {
    let a = dir.dot(&dir);
    if a <= 0.0 {
        return None;
    }
    let b = origin.dot(&dir);
    let c = origin.dot(&origin) - 1.0;
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / a;
    (t > 0.0).then_some(t)
}

/// Inner and outer colours of the radial background
pub fn background_colors(hsl: Hsl) -> (Vec3, Vec3) {
    let inner = Hsl::new(hsl.h, hsl.s * 0.7, hsl.l).to_rgb();
    let outer = Hsl::new(hsl.h, hsl.s * 0.4, hsl.l * 0.2).to_rgb();
    (inner, outer)
}

/// Sphere-local fragment seen through pixel (px, py), if the sphere is there
pub fn fragment_at(
    camera: &Camera,
    params: &RenderParameters,
    px: f32,
    py: f32,
    width: u32,
    height: u32,
) -> Option<FragmentContext> {
    let origin = params.camera_local;
    let dir = params
        .world_to_local
        .transform_vector(camera.primary_ray(px, py, width, height));
    let t = intersect_unit_sphere(origin, dir)?;
    let hit = origin + dir * t;
    Some(FragmentContext {
        local_position: hit,
        view_direction_local: hit - origin,
    })
}

/// March trace behind pixel (px, py), or `None` on a background pixel
pub fn probe_pixel<N, D>(
    material: &MarbleMaterial<N, D>,
    camera: &Camera,
    px: f32,
    py: f32,
    width: u32,
    height: u32,
) -> Option<Vec<MarchStep>>
where
    N: Sampler2D,
    D: Sampler2D,
{
    fragment_at(camera, material.params(), px, py, width, height)
        .map(|frag| material.trace(&frag))
}

/// Does the ray through pixel (px, py) land on the sphere?
pub fn sphere_hit_at(
    camera: &Camera,
    params: &RenderParameters,
    px: f32,
    py: f32,
    width: u32,
    height: u32,
) -> bool {
    fragment_at(camera, params, px, py, width, height).is_some()
}

/// Shade one full frame into `buffer`
pub fn render_frame<N, D>(
    buffer: &mut PixelBuffer,
    material: &MarbleMaterial<N, D>,
    camera: &Camera,
    background: Hsl,
) where
    N: Sampler2D,
    D: Sampler2D,
{
    let width = buffer.width();
    let height = buffer.height();
    let stride = buffer.stride();
    if width == 0 || height == 0 {
        return;
    }

    let params = material.params();
    let (inner, outer) = background_colors(background);
    let cx = width as f32 * 0.5;
    let cy = height as f32 * 0.5;
    let max_dist = (cx * cx + cy * cy).sqrt();

    buffer
        .as_bytes_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(py, row)| {
            let fy = py as f32;
            let dy = fy + 0.5 - cy;
            for (px, dest) in row.chunks_exact_mut(4).enumerate() {
                let fx = px as f32;
                let dx = fx + 0.5 - cx;
                let t = ((dx * dx + dy * dy).sqrt() / max_dist).min(1.0);
                let (r, g, b, _) = Rgba::from_rgb(inner + (outer - inner) * t, 1.0).to_u8();
                write_pixel(dest, r, g, b);

                let Some(frag) = fragment_at(camera, params, fx, fy, width, height) else {
                    continue;
                };
                let (r, g, b, a) = material.compute_surface_color(&frag).to_u8();
                blend_pixel_into(dest, r, g, b, a);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marble::MarbleTunables;
    use crate::math3d::Mat4;
    use crate::texture::Texture;

    fn solid_material() -> MarbleMaterial {
        let tunables = MarbleTunables {
            iterations: 1,
            smoothing: 0.0,
            ..MarbleTunables::default()
        };
        let mut params = RenderParameters::new(tunables).expect("valid");
        params.camera_local = Vec3::new(0.0, 0.0, 2.0);
        MarbleMaterial::new(params, Texture::solid(255, 255, 255), Texture::solid(128, 128, 128))
    }

    fn camera() -> Camera {
        Camera::look_at(Vec3::new(0.0, 0.0, 2.0), Vec3::zero(), 75.0)
    }

    #[test]
    fn test_camera_basis() {
        let cam = camera();
        let centre = cam.primary_ray(4.0, 4.0, 9, 9);
        assert!(centre.approx_eq(&Vec3::new(0.0, 0.0, -1.0), 1e-5));
        // Top-left pixel points up and to the left
        let corner = cam.primary_ray(0.0, 0.0, 9, 9);
        assert!(corner.x < 0.0 && corner.y > 0.0);
    }

    #[test]
    fn test_unit_sphere_intersection() {
        let origin = Vec3::new(0.0, 0.0, 2.0);
        assert_eq!(intersect_unit_sphere(origin, Vec3::new(0.0, 0.0, -2.0)), Some(0.5));
        assert!(intersect_unit_sphere(origin, Vec3::new(0.0, 1.0, 0.0)).is_none());
        // Sphere behind the ray
        assert!(intersect_unit_sphere(origin, Vec3::new(0.0, 0.0, 1.0)).is_none());
    }

    #[test]
    fn test_centre_pixel_shows_full_volume() {
        let material = solid_material();
        let mut buffer = PixelBuffer::with_size(9, 9);
        render_frame(&mut buffer, &material, &camera(), Hsl::new(200.0, 50.0, 50.0));
        assert_eq!(buffer.get_pixel(4, 4), Some((255, 0, 0)));
    }

    #[test]
    fn test_corner_pixel_shows_background() {
        let material = solid_material();
        let mut buffer = PixelBuffer::with_size(9, 9);
        let bg = Hsl::new(0.0, 0.0, 50.0);
        render_frame(&mut buffer, &material, &camera(), bg);
        let (r, g, b) = buffer.get_pixel(0, 0).expect("in bounds");
        // Grey gradient, darker than the centre colour
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!(r < 128);
    }

    #[test]
    fn test_picking_follows_world_transform() {
        let cam = camera();
        let mut params = RenderParameters::new(MarbleTunables::default()).expect("valid");
        params.camera_local = Vec3::new(0.0, 0.0, 2.0);
        assert!(sphere_hit_at(&cam, &params, 50.0, 50.0, 100, 100));
        assert!(!sphere_hit_at(&cam, &params, 0.0, 0.0, 100, 100));

        // Shrinking the sphere pulls the camera further away in local space
        let world_to_local = Mat4::from_scale(0.1).inverse().expect("invertible");
        params.camera_local = world_to_local.transform_point(Vec3::new(0.0, 0.0, 2.0));
        params.world_to_local = world_to_local;
        assert!(!sphere_hit_at(&cam, &params, 30.0, 50.0, 100, 100));
        assert!(sphere_hit_at(&cam, &params, 50.0, 50.0, 100, 100));
    }

    #[test]
    fn test_background_gradient_darkens_outward() {
        let (inner, outer) = background_colors(Hsl::new(0.0, 100.0, 50.0));
        assert!(inner.x > outer.x);
        assert!(inner.approx_eq(&Vec3::new(0.85, 0.15, 0.15), 1e-4));
    }

    #[test]
    fn test_background_quantises_like_surface_colours() {
        let material = solid_material();
        // Facing away from the sphere, so the single pixel is pure gradient centre
        let away = Camera::look_at(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 5.0), 75.0);
        let bg = Hsl::new(200.0, 50.0, 50.0);
        let mut buffer = PixelBuffer::with_size(1, 1);
        render_frame(&mut buffer, &material, &away, bg);

        let (inner, _) = background_colors(bg);
        let (r, g, b, _) = Rgba::from_rgb(inner, 1.0).to_u8();
        assert_eq!(buffer.get_pixel(0, 0), Some((r, g, b)));
    }

    #[test]
    fn test_probe_reports_every_step_on_the_sphere() {
        let material = solid_material();
        let steps = probe_pixel(&material, &camera(), 4.0, 4.0, 9, 9).expect("centre hits");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].mask, 1.0);
        assert!((steps[0].depth_frac - 1.0).abs() < 1e-5);
        assert!(probe_pixel(&material, &camera(), 0.0, 0.0, 9, 9).is_none());
    }
}
