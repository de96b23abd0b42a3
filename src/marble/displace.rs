//! Scrolling displacement of sample points.

use super::projection::equirect_uv;
use crate::math3d::{Vec2, Vec3};
use crate::texture::Sampler2D;

/// Offset `p` by two reads of the displacement map.
///
/// One read scrolls with `time`, the other is mirrored in `v` and scrolls
/// the opposite way; each is remapped from [0, 1] to [-1, 1] per channel
/// before summing. `strength == 0` returns `p` unchanged.
#[inline]
pub fn displace_point<S>(p: Vec3, time: f32, strength: f32, map: &S) -> Vec3
where
    S: Sampler2D + ?Sized,
{
    let uv = equirect_uv(p);
    let scroll = Vec2::new(time, 0.0);

    let upright = map.sample(uv + scroll);
    let flipped = map.sample(Vec2::new(uv.x, -uv.y) - scroll);

    let disp_a = upright * 2.0 - Vec3::splat(1.0);
    let disp_b = flipped * 2.0 - Vec3::splat(1.0);

    p + strength * (disp_a + disp_b)
}
