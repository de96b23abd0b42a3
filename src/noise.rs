//! Noise Generation Utilities
//!
//! Hashed lattice value noise and fractional Brownian motion. The tiled
//! variants wrap their lattice so the result repeats seamlessly, which is
//! what the marble's repeat-addressed textures need.

/// Hash-based pseudo-random value for integer grid coordinates.
/// Returns a value in [0.0, 1.0].
#[inline]
pub fn noise_hash(x: i32, y: i32, seed: u32) -> f32 {
    let mut h = seed.wrapping_add(x as u32).wrapping_mul(374761393);
    h = h.wrapping_add(y as u32).wrapping_mul(668265263);
    h = (h ^ (h >> 13)).wrapping_mul(1274126177);
    h ^= h >> 16;
    (h & 0x7fff) as f32 / 0x7fff as f32
}

/// Hermite fade curve: 3t² - 2t³
#[inline]
pub fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// 2D value noise whose lattice repeats every `period` cells.
/// Returns a value in [0.0, 1.0].
pub fn value_noise_2d_tiled(x: f32, y: f32, period: i32, seed: u32) -> f32 {
    let period = period.max(1);
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    let fx = fade(x - ix as f32);
    let fy = fade(y - iy as f32);

    let x0 = ix.rem_euclid(period);
    let y0 = iy.rem_euclid(period);
    let x1 = (ix + 1).rem_euclid(period);
    let y1 = (iy + 1).rem_euclid(period);

    let c00 = noise_hash(x0, y0, seed);
    let c10 = noise_hash(x1, y0, seed);
    let c01 = noise_hash(x0, y1, seed);
    let c11 = noise_hash(x1, y1, seed);

    let top = c00 + (c10 - c00) * fx;
    let bottom = c01 + (c11 - c01) * fx;

    top + (bottom - top) * fy
}

/// Tileable 2D fBm over the unit square: `(u, v)` in [0, 1) maps onto
/// `base_period` lattice cells for the first octave, doubling per octave so
/// every octave still tiles at the unit boundary.
///
/// Output is renormalised to [0.0, 1.0].
pub fn fbm_2d_tiled(u: f32, v: f32, base_period: i32, octaves: u32, seed: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut total = 0.0;
    let mut period = base_period.max(1);
    for octave in 0..octaves {
        let s = seed.wrapping_add(octave.wrapping_mul(1013));
        value += amplitude * value_noise_2d_tiled(u * period as f32, v * period as f32, period, s);
        total += amplitude;
        amplitude *= 0.5;
        period = period.saturating_mul(2);
    }
    if total > 0.0 {
        value / total
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_hash_deterministic() {
        let v1 = noise_hash(10, 20, 42);
        let v2 = noise_hash(10, 20, 42);
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_noise_hash_range() {
        for x in -10..10 {
            for y in -10..10 {
                let v = noise_hash(x, y, 12345);
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_fade_bounds() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert!((fade(0.5) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_tiled_noise_repeats() {
        let period = 8;
        for i in 0..50 {
            let x = i as f32 * 0.37;
            let y = i as f32 * 0.21;
            let a = value_noise_2d_tiled(x, y, period, 7);
            let b = value_noise_2d_tiled(x + period as f32, y - period as f32, period, 7);
            assert!((a - b).abs() < 1e-5, "noise does not tile at ({x}, {y})");
        }
    }

    #[test]
    fn test_tiled_fbm_seamless_across_unit_square() {
        for i in 0..32 {
            let v = i as f32 / 32.0;
            let left = fbm_2d_tiled(0.0, v, 4, 4, 99);
            let right = fbm_2d_tiled(1.0, v, 4, 4, 99);
            assert!((left - right).abs() < 1e-4);
            assert!((0.0..=1.0).contains(&left));
        }
    }

    #[test]
    fn test_tiled_noise_continuity() {
        let seed = 999;
        for i in 0..100 {
            let x = i as f32 * 0.1;
            let v1 = value_noise_2d_tiled(x, 0.3, 16, seed);
            let v2 = value_noise_2d_tiled(x + 0.01, 0.3, 16, seed);
            assert!((v1 - v2).abs() < 0.5, "Noise discontinuity at x={}", x);
        }
    }
}
