//! Accumulated volume to output colour.

use crate::math3d::{lerp, Vec3};

/// Linear RGBA with channels in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn from_rgb(rgb: Vec3, a: f32) -> Self {
        Self::new(rgb.x, rgb.y, rgb.z, a)
    }

    #[cfg(test)]
    pub fn rgb(&self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Quantise to 8-bit channels, saturating out-of-range values
    #[inline]
    pub fn to_u8(&self) -> (u8, u8, u8, u8) {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        (q(self.r), q(self.g), q(self.b), q(self.a))
    }
}

/// Blend `color_a` toward `color_b` by the clamped volume `c`
#[inline]
pub fn resolve_color(c: f32, color_a: Vec3, color_b: Vec3, opacity: f32) -> Rgba {
    Rgba::from_rgb(lerp(color_a, color_b, c.clamp(0.0, 1.0)), opacity)
}
