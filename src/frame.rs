//! Per-frame parameter update.
//!
//! Runs once per frame before any fragment is shaded. Owns the springs that
//! ease the displacement scroll and the palette colour between steps.

use crate::animation::{Spring, SpringConfig};
use crate::error::MarbleError;
use crate::marble::{MarbleTunables, RenderParameters};
use crate::math3d::{Mat4, Vec3};
use crate::palette::{palette_entry, Hsl};

/// Scroll speed of the displacement maps per second of elapsed time
pub const TIME_SCALE: f32 = 0.05;
/// Extra scroll added for every palette step
pub const STEP_TIME_OFFSET: f32 = 0.2;

/// Everything the frame update reads from the application side
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInputs {
    /// Seconds since start
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub dt: f32,
    pub sphere_world_transform: Mat4,
    pub camera_world_position: Vec3,
    pub step: u64,
    pub tunables: MarbleTunables,
}

pub struct ParameterUpdater {
    time_offset: Spring<1>,
    color: Spring<3>,
    last_step: u64,
    /// Forward steps seen so far; a reset never lowers it, so the scroll
    /// offset only grows
    scroll_steps: u64,
}

impl ParameterUpdater {
    /// Start at rest on the values for `step`
    pub fn new(step: u64) -> Self {
        Self {
            time_offset: Spring::scalar(step as f32 * STEP_TIME_OFFSET, SpringConfig::GENTLE),
            color: Spring::new(palette_entry(step).to_array(), SpringConfig::GENTLE),
            last_step: step,
            scroll_steps: step,
        }
    }

    /// Current eased palette colour, shared with the background
    pub fn background_hsl(&self) -> Hsl {
        Hsl::from_array(self.color.current())
    }

    /// Write this frame's uniforms into `params`.
    ///
    /// Springs are advanced even when an error is returned, so a bad
    /// transform on one frame does not stall the animation.
    pub fn apply(
        &mut self,
        params: &mut RenderParameters,
        inputs: &FrameInputs,
    ) -> Result<(), MarbleError> {
        if inputs.step != self.last_step {
            log::debug!("palette step {} -> {}", self.last_step, inputs.step);
            if inputs.step > self.last_step {
                self.scroll_steps += inputs.step - self.last_step;
                self.time_offset
                    .set_scalar_target(self.scroll_steps as f32 * STEP_TIME_OFFSET);
            }
            self.color.set_target(palette_entry(inputs.step).to_array());
            self.last_step = inputs.step;
        }
        self.time_offset.update(inputs.dt);
        self.color.update(inputs.dt);

        let world_to_local = inputs
            .sphere_world_transform
            .inverse()
            .ok_or_else(|| MarbleError::invalid("world_transform", "matrix is not invertible"))?;
        params.set_tunables(inputs.tunables)?;

        params.time = self.time_offset.value() + inputs.elapsed * TIME_SCALE;
        params.color_b = self.background_hsl().to_rgb();
        params.camera_local = world_to_local.transform_point(inputs.camera_world_position);
        params.world_to_local = world_to_local;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(step: u64, elapsed: f32, dt: f32) -> FrameInputs {
        FrameInputs {
            elapsed,
            dt,
            sphere_world_transform: Mat4::IDENTITY,
            camera_world_position: Vec3::new(0.0, 0.0, 2.0),
            step,
            tunables: MarbleTunables::default(),
        }
    }

    fn params() -> RenderParameters {
        RenderParameters::new(MarbleTunables::default()).expect("defaults")
    }

    #[test]
    fn test_time_is_clock_scaled_at_rest() {
        let mut updater = ParameterUpdater::new(0);
        let mut p = params();
        updater.apply(&mut p, &inputs(0, 10.0, 0.016)).expect("apply");
        assert!((p.time - 0.5).abs() < 1e-6);
        // Initial colour is palette[0], pure red
        assert!(p.color_b.approx_eq(&Vec3::new(1.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_step_eases_toward_next_palette_entry() {
        let mut updater = ParameterUpdater::new(0);
        let mut p = params();
        updater.apply(&mut p, &inputs(1, 0.0, 0.05)).expect("apply");
        let partial = updater.background_hsl();
        assert!(partial.h > 0.0 && partial.h < 60.0);

        for _ in 0..200 {
            updater.apply(&mut p, &inputs(1, 0.0, 0.05)).expect("apply");
        }
        // Yellow, with the scroll offset settled at one step
        assert!(p.color_b.approx_eq(&Vec3::new(1.0, 1.0, 0.0), 1e-2));
        assert!((p.time - STEP_TIME_OFFSET).abs() < 1e-2);
    }

    #[test]
    fn test_reset_keeps_time_moving_forward() {
        let mut updater = ParameterUpdater::new(10);
        let mut p = params();
        updater.apply(&mut p, &inputs(10, 0.0, 0.016)).expect("apply");
        let before = p.time;

        let mut last = before;
        for i in 1..=60 {
            let elapsed = i as f32 / 60.0;
            updater.apply(&mut p, &inputs(0, elapsed, 1.0 / 60.0)).expect("apply");
            assert!(p.time >= last, "time went from {last} to {}", p.time);
            last = p.time;
        }
        assert!(p.time > before);
        // Palette still returns to the first entry
        for _ in 0..300 {
            updater.apply(&mut p, &inputs(0, 1.0, 0.05)).expect("apply");
        }
        assert!(p.color_b.approx_eq(&Vec3::new(1.0, 0.0, 0.0), 1e-2));

        // Stepping again after the reset scrolls on from where it was
        updater.apply(&mut p, &inputs(1, 1.0, 0.05)).expect("apply");
        for _ in 0..300 {
            updater.apply(&mut p, &inputs(1, 1.0, 0.05)).expect("apply");
        }
        let settled = 11.0 * STEP_TIME_OFFSET + TIME_SCALE;
        assert!((p.time - settled).abs() < 1e-2);
    }

    #[test]
    fn test_palette_wraps_after_five_steps() {
        let a = ParameterUpdater::new(5).background_hsl();
        let b = ParameterUpdater::new(0).background_hsl();
        assert_eq!(a, b);
    }

    #[test]
    fn test_world_to_local_is_inverse() {
        let mut updater = ParameterUpdater::new(0);
        let mut p = params();
        let mut frame = inputs(0, 0.0, 0.016);
        frame.sphere_world_transform = Mat4::from_scale(0.5);
        updater.apply(&mut p, &frame).expect("apply");
        let local = p.world_to_local.transform_point(Vec3::new(0.5, 0.0, 0.0));
        assert!(local.approx_eq(&Vec3::new(1.0, 0.0, 0.0), 1e-5));
        assert!(p.camera_local.approx_eq(&Vec3::new(0.0, 0.0, 4.0), 1e-5));
    }

    #[test]
    fn test_singular_transform_is_rejected() {
        let mut updater = ParameterUpdater::new(0);
        let mut p = params();
        let mut frame = inputs(0, 1.0, 0.016);
        frame.sphere_world_transform = Mat4::from_scale(0.0);
        assert!(updater.apply(&mut p, &frame).is_err());
        // Previous uniforms are left untouched
        assert_eq!(p.world_to_local, Mat4::IDENTITY);
        assert_eq!(p.time, 0.0);
    }

    #[test]
    fn test_invalid_tunables_are_rejected() {
        let mut updater = ParameterUpdater::new(0);
        let mut p = params();
        let mut frame = inputs(0, 0.0, 0.016);
        frame.tunables.iterations = 0;
        assert!(updater.apply(&mut p, &frame).is_err());
        assert_eq!(p.tunables().iterations, 48);
    }
}
