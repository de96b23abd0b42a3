//! Interaction state around the marble: clock, orbit camera, pointer
//! feedback and the palette step counter.

use std::f32::consts::TAU;

use crate::animation::{Spring, SpringConfig};
use crate::frame::FrameInputs;
use crate::marble::MarbleTunables;
use crate::math3d::{Mat4, Vec3};
use crate::renderer::Camera;

pub const CAMERA_DISTANCE: f32 = 2.0;
pub const CAMERA_FOV_Y: f32 = 75.0;
/// One full orbit every 30 seconds
pub const ORBIT_SPEED: f32 = TAU / 30.0;
/// Sphere scale while pressed under the pointer
pub const PRESSED_SCALE: f32 = 0.95;

pub struct Scene {
    elapsed: f32,
    dt: f32,
    step: u64,
    orbit_angle: f32,
    hovered: bool,
    pressed: bool,
    press_on_sphere: bool,
    scale: Spring<1>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            dt: 0.0,
            step: 0,
            orbit_angle: 0.0,
            hovered: false,
            pressed: false,
            press_on_sphere: false,
            scale: Spring::scalar(1.0, SpringConfig::SNAPPY),
        }
    }

    /// Move the clock, orbit and press spring forward by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.dt = dt;
        self.elapsed += dt;
        self.orbit_angle = (self.orbit_angle + ORBIT_SPEED * dt).rem_euclid(TAU);

        let target = if self.hovered && self.pressed {
            PRESSED_SCALE
        } else {
            1.0
        };
        self.scale.set_scalar_target(target);
        self.scale.update(dt);
    }

    #[inline]
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn advance_step(&mut self) {
        self.step = self.step.wrapping_add(1);
    }

    pub fn reset_step(&mut self) {
        self.step = 0;
    }

    pub fn pointer_moved(&mut self, on_sphere: bool) {
        self.hovered = on_sphere;
    }

    pub fn pointer_left(&mut self) {
        self.hovered = false;
    }

    pub fn pointer_down(&mut self, on_sphere: bool) {
        self.hovered = on_sphere;
        self.pressed = true;
        self.press_on_sphere = on_sphere;
    }

    /// Release the pointer. Returns true when this completed a click on the
    /// sphere, which advances the step counter.
    pub fn pointer_up(&mut self, on_sphere: bool) -> bool {
        self.hovered = on_sphere;
        let clicked = self.pressed && self.press_on_sphere && on_sphere;
        self.pressed = false;
        self.press_on_sphere = false;
        if clicked {
            self.advance_step();
        }
        clicked
    }

    /// Current uniform scale of the sphere
    pub fn sphere_scale(&self) -> f32 {
        self.scale.value()
    }

    pub fn sphere_transform(&self) -> Mat4 {
        Mat4::from_scale(self.sphere_scale())
    }

    /// Camera placement: pushed back along +Z, then orbited around +Y
    pub fn camera_transform(&self) -> Mat4 {
        Mat4::from_rotation_y(self.orbit_angle)
            .mul_mat(&Mat4::from_translation(Vec3::new(0.0, 0.0, CAMERA_DISTANCE)))
    }

    pub fn camera_position(&self) -> Vec3 {
        self.camera_transform().transform_point(Vec3::zero())
    }

    pub fn camera(&self) -> Camera {
        Camera::look_at(self.camera_position(), Vec3::zero(), CAMERA_FOV_Y)
    }

    pub fn frame_inputs(&self, tunables: MarbleTunables) -> FrameInputs {
        FrameInputs {
            elapsed: self.elapsed,
            dt: self.dt,
            sphere_world_transform: self.sphere_transform(),
            camera_world_position: self.camera_position(),
            step: self.step,
            tunables,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_on_sphere_advances_step() {
        let mut scene = Scene::new();
        scene.pointer_down(true);
        assert!(scene.pointer_up(true));
        assert_eq!(scene.step(), 1);
    }

    #[test]
    fn test_drag_off_sphere_is_not_a_click() {
        let mut scene = Scene::new();
        scene.pointer_down(true);
        assert!(!scene.pointer_up(false));
        scene.pointer_down(false);
        assert!(!scene.pointer_up(true));
        assert_eq!(scene.step(), 0);
    }

    #[test]
    fn test_press_shrinks_only_while_hovered() {
        let mut scene = Scene::new();
        scene.pointer_down(false);
        for _ in 0..60 {
            scene.advance(1.0 / 60.0);
        }
        assert_eq!(scene.sphere_scale(), 1.0);

        scene.pointer_moved(true);
        for _ in 0..120 {
            scene.advance(1.0 / 60.0);
        }
        assert!((scene.sphere_scale() - PRESSED_SCALE).abs() < 1e-3);

        scene.pointer_left();
        for _ in 0..120 {
            scene.advance(1.0 / 60.0);
        }
        assert!((scene.sphere_scale() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_camera_orbits_at_fixed_distance() {
        let mut scene = Scene::new();
        assert!(scene
            .camera_position()
            .approx_eq(&Vec3::new(0.0, 0.0, CAMERA_DISTANCE), 1e-6));
        scene.advance(7.5);
        // Quarter turn: +Z swings to +X
        let pos = scene.camera_position();
        assert!(pos.approx_eq(&Vec3::new(CAMERA_DISTANCE, 0.0, 0.0), 1e-4));
        assert!((pos.length() - CAMERA_DISTANCE).abs() < 1e-5);
    }

    #[test]
    fn test_frame_inputs_carry_state() {
        let mut scene = Scene::new();
        scene.advance_step();
        scene.advance_step();
        scene.advance(0.5);
        let inputs = scene.frame_inputs(MarbleTunables::default());
        assert_eq!(inputs.step, 2);
        assert_eq!(inputs.elapsed, 0.5);
        assert_eq!(inputs.dt, 0.5);
        scene.reset_step();
        assert_eq!(scene.step(), 0);
    }
}
