//! Fixed colour palette cycled by the step counter.

use crate::math3d::Vec3;

/// HSL in display units: hue in degrees, saturation and lightness in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub const fn to_array(self) -> [f32; 3] {
        [self.h, self.s, self.l]
    }

    pub const fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Linear RGB in [0, 1]
    pub fn to_rgb(self) -> Vec3 {
        hsl_to_rgb(self.h / 360.0, self.s / 100.0, self.l / 100.0)
    }
}

pub const PALETTE: [Hsl; 5] = [
    Hsl::new(0.0, 100.0, 50.0),
    Hsl::new(60.0, 100.0, 50.0),
    Hsl::new(150.0, 100.0, 50.0),
    Hsl::new(240.0, 70.0, 60.0),
    Hsl::new(0.0, 0.0, 80.0),
];

/// Palette entry for a step counter value; wraps with period 5
#[inline]
pub fn palette_entry(step: u64) -> Hsl {
    PALETTE[(step % PALETTE.len() as u64) as usize]
}

/// HSL to RGB colour conversion
/// h, s, l: 0-1 (hue wraps)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(l);
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Vec3::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert!(hsl_to_rgb(0.0, 1.0, 0.5).approx_eq(&Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert!(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5).approx_eq(&Vec3::new(0.0, 1.0, 0.0), 1e-5));
        assert!(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5).approx_eq(&Vec3::new(0.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn test_grey_has_equal_channels() {
        let c = PALETTE[4].to_rgb();
        assert!(c.approx_eq(&Vec3::splat(0.8), 1e-6));
    }

    #[test]
    fn test_yellow_entry() {
        assert!(PALETTE[1].to_rgb().approx_eq(&Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn test_palette_wraps_every_five_steps() {
        assert_eq!(palette_entry(5), palette_entry(0));
        assert_eq!(palette_entry(7), palette_entry(2));
        assert_eq!(palette_entry(0), Hsl::new(0.0, 100.0, 50.0));
        let distinct: Vec<Hsl> = (0..5).map(palette_entry).collect();
        for (i, a) in distinct.iter().enumerate() {
            for b in &distinct[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
