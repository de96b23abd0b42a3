//! Texture storage and sampling for the marble material.
//!
//! Textures are addressed with repeat wrapping and nearest-neighbour
//! filtering only. Both maps are generated procedurally so they tile.

use crate::math3d::{Vec2, Vec3};
use crate::noise::fbm_2d_tiled;

/// A 2D texture source addressed in UV space with repeat wrapping.
///
/// Channels come back normalised to [0, 1] as `(r, g, b)` in `(x, y, z)`.
pub trait Sampler2D: Sync {
    fn sample(&self, uv: Vec2) -> Vec3;

    /// Red channel only, for single-channel height/density maps
    #[inline]
    fn sample_red(&self, uv: Vec2) -> f32 {
        self.sample(uv).x
    }
}

/// A texture stored as RGBA pixels
#[derive(Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>, // RGBA format, 4 bytes per pixel
}

impl Texture {
    /// 1x1 texture of a single colour
    #[cfg(test)]
    pub fn solid(r: u8, g: u8, b: u8) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![r, g, b, 255],
        }
    }

    /// Texture from raw RGBA rows, top row first
    #[cfg(test)]
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nearest-neighbour sample with UV coordinates (wrapping).
    /// Returns (r, g, b) - alpha is discarded.
    #[inline]
    pub fn sample_rgb(&self, u: f32, v: f32) -> (u8, u8, u8) {
        // rem_euclid keeps negative coordinates wrapping the right way
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = (u * self.width as f32) as u32 % self.width;
        let y = (v * self.height as f32) as u32 % self.height;

        let idx = ((y * self.width + x) * 4) as usize;
        (self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }
}

impl Sampler2D for Texture {
    #[inline]
    fn sample(&self, uv: Vec2) -> Vec3 {
        let (r, g, b) = self.sample_rgb(uv.x, uv.y);
        Vec3::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }
}

// ============================================================================
// Procedural Texture Generators
// ============================================================================

impl Texture {
    /// Single-channel cloudy noise used as the marble's density field.
    /// Stored as grey so any channel reads the same value.
    pub fn density_map(size: u32, seed: u32) -> Self {
        let size = size.max(1);
        let mut data = vec![0u8; size as usize * size as usize * 4];

        for py in 0..size {
            let v = py as f32 / size as f32;
            for px in 0..size {
                let u = px as f32 / size as f32;
                let n = fbm_2d_tiled(u, v, 4, 5, seed);
                // Stretch contrast so both ends of the cutoff ramp get hit
                let n = ((n - 0.5) * 1.8 + 0.5).clamp(0.0, 1.0);
                let g = (n * 255.0) as u8;

                let idx = (py as usize * size as usize + px as usize) * 4;
                data[idx] = g;
                data[idx + 1] = g;
                data[idx + 2] = g;
                data[idx + 3] = 255;
            }
        }

        Self {
            width: size,
            height: size,
            pixels: data,
        }
    }

    /// Three independent low-frequency noise channels, read as a vector field
    pub fn displacement_map(size: u32, seed: u32) -> Self {
        let size = size.max(1);
        let mut data = vec![0u8; size as usize * size as usize * 4];

        for py in 0..size {
            let v = py as f32 / size as f32;
            for px in 0..size {
                let u = px as f32 / size as f32;
                let r = fbm_2d_tiled(u, v, 2, 3, seed);
                let g = fbm_2d_tiled(u, v, 2, 3, seed.wrapping_add(7919));
                let b = fbm_2d_tiled(u, v, 2, 3, seed.wrapping_add(15887));

                let idx = (py as usize * size as usize + px as usize) * 4;
                data[idx] = (r * 255.0) as u8;
                data[idx + 1] = (g * 255.0) as u8;
                data[idx + 2] = (b * 255.0) as u8;
                data[idx + 3] = 255;
            }
        }

        Self {
            width: size,
            height: size,
            pixels: data,
        }
    }
}
