//! Material parameters: the per-frame uniform block and its tunables.

use serde::{Deserialize, Serialize};

use crate::error::MarbleError;
use crate::math3d::{Mat4, Vec3};

/// Upper bound on march iterations accepted from configuration
pub const ITERATIONS_MAX: u32 = 256;

/// User-tunable march settings. Constant across a frame and all fragments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarbleTunables {
    pub iterations: u32,
    pub max_depth: f32,
    pub smoothing: f32,
    pub refraction: f32,
    pub displacement_strength: f32,
}

impl Default for MarbleTunables {
    fn default() -> Self {
        Self {
            iterations: 48,
            max_depth: 0.6,
            smoothing: 0.2,
            refraction: 0.0,
            // Each displacement read spans [-1, 1], so this matches a
            // strength of 0.1 over half-range reads.
            displacement_strength: 0.05,
        }
    }
}

impl MarbleTunables {
    pub const NAMES: [&'static str; 5] = [
        "iterations",
        "max_depth",
        "smoothing",
        "refraction",
        "displacement_strength",
    ];

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), MarbleError> {
        if !(1..=ITERATIONS_MAX).contains(&self.iterations) {
            return Err(MarbleError::invalid(
                "iterations",
                format!("{} is outside 1..={ITERATIONS_MAX}", self.iterations),
            ));
        }
        check_unit("max_depth", self.max_depth)?;
        check_unit("smoothing", self.smoothing)?;
        check_unit("refraction", self.refraction)?;
        check_range("displacement_strength", self.displacement_strength, 0.0, 1.0)?;
        Ok(())
    }

    /// Set one tunable by name, keeping the old value if the new one is invalid
    pub fn set(&mut self, name: &str, value: f32) -> Result<(), MarbleError> {
        let mut candidate = *self;
        match name {
            "iterations" => {
                if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
                    return Err(MarbleError::invalid(name, format!("{value} is not a whole number")));
                }
                candidate.iterations = value as u32;
            },
            "max_depth" | "depth" => candidate.max_depth = value,
            "smoothing" => candidate.smoothing = value,
            "refraction" => candidate.refraction = value,
            "displacement_strength" | "displacement" => candidate.displacement_strength = value,
            _ => {
                return Err(MarbleError::invalid(
                    name,
                    format!("unknown tunable, expected one of {}", Self::NAMES.join(", ")),
                ))
            },
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

fn check_unit(name: &str, value: f32) -> Result<(), MarbleError> {
    check_range(name, value, 0.0, 1.0)
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<(), MarbleError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(MarbleError::invalid(name, format!("{value} is outside [{min}, {max}]")))
    }
}

/// Uniform block read by every fragment of a frame.
///
/// Written once per frame before shading starts, then shared read-only.
/// Tunables can only be replaced through [`RenderParameters::set_tunables`],
/// so a constructed value always has `iterations >= 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParameters {
    /// Displacement scroll offset (clock term plus per-step offset)
    pub time: f32,
    pub color_a: Vec3,
    pub color_b: Vec3,
    /// Inverse of the sphere's world transform
    pub world_to_local: Mat4,
    /// Camera position carried into sphere-local space by `world_to_local`
    pub camera_local: Vec3,
    /// Output alpha
    pub opacity: f32,
    tunables: MarbleTunables,
}

impl RenderParameters {
    pub fn new(tunables: MarbleTunables) -> Result<Self, MarbleError> {
        tunables.validate()?;
        Ok(Self {
            time: 0.0,
            color_a: Vec3::zero(),
            color_b: Vec3::new(1.0, 0.0, 0.0),
            world_to_local: Mat4::IDENTITY,
            camera_local: Vec3::zero(),
            opacity: 1.0,
            tunables,
        })
    }

    #[inline]
    pub fn tunables(&self) -> &MarbleTunables {
        &self.tunables
    }

    pub fn set_tunables(&mut self, tunables: MarbleTunables) -> Result<(), MarbleError> {
        tunables.validate()?;
        self.tunables = tunables;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MarbleTunables::default().validate().is_ok());
        let params = RenderParameters::new(MarbleTunables::default()).expect("defaults");
        assert_eq!(params.tunables().iterations, 48);
        assert_eq!(params.opacity, 1.0);
        assert_eq!(params.color_a, Vec3::zero());
    }

    #[test]
    fn test_zero_iterations_rejected_at_construction() {
        let tunables = MarbleTunables {
            iterations: 0,
            ..MarbleTunables::default()
        };
        assert!(matches!(
            RenderParameters::new(tunables),
            Err(MarbleError::InvalidParameter { ref name, .. }) if name == "iterations"
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let base = MarbleTunables::default();
        let bad = [
            MarbleTunables { max_depth: 1.5, ..base },
            MarbleTunables { smoothing: -0.1, ..base },
            MarbleTunables { refraction: f32::NAN, ..base },
            MarbleTunables { displacement_strength: -0.01, ..base },
            MarbleTunables { iterations: ITERATIONS_MAX + 1, ..base },
        ];
        for t in bad {
            assert!(t.validate().is_err(), "{t:?} should be rejected");
        }
    }

    #[test]
    fn test_set_by_name_keeps_old_value_on_error() {
        let mut t = MarbleTunables::default();
        t.set("smoothing", 0.5).expect("in range");
        assert_eq!(t.smoothing, 0.5);
        assert!(t.set("smoothing", 2.0).is_err());
        assert_eq!(t.smoothing, 0.5);
        assert!(t.set("iterations", 0.0).is_err());
        assert!(t.set("iterations", 2.5).is_err());
        t.set("iterations", 64.0).expect("whole number");
        assert_eq!(t.iterations, 64);
        assert!(t.set("gloss", 0.1).is_err());
    }

    #[test]
    fn test_set_tunables_validates() {
        let mut params = RenderParameters::new(MarbleTunables::default()).expect("defaults");
        let bad = MarbleTunables {
            iterations: 0,
            ..MarbleTunables::default()
        };
        assert!(params.set_tunables(bad).is_err());
        assert_eq!(params.tunables().iterations, 48);
    }

    #[test]
    fn test_tunables_json_fills_missing_fields() {
        let t: MarbleTunables = serde_json::from_str(r#"{"iterations": 16}"#).expect("json");
        assert_eq!(t.iterations, 16);
        assert_eq!(t.max_depth, 0.6);
    }
}
