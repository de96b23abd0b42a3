//! Spring-damper animation
//!
//! A mass on a spring chasing a target, integrated with semi-implicit Euler
//! in fixed sub-steps so large frame deltas stay stable. Consumers only ever
//! read [`Spring::current`]; retargeting keeps position and velocity so
//! motion stays continuous.

/// Physical constants of a spring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub tension: f32,
    pub friction: f32,
    pub mass: f32,
    /// Distance and speed below which the spring snaps to rest
    pub precision: f32,
}

impl SpringConfig {
    pub const fn new(tension: f32, friction: f32) -> Self {
        Self {
            tension,
            friction,
            mass: 1.0,
            precision: 1e-3,
        }
    }

    /// Slow, soft settle used for palette and time-offset transitions
    pub const GENTLE: Self = Self::new(50.0, 26.0);
    /// Stiff, bouncy response used for press feedback
    pub const SNAPPY: Self = Self::new(300.0, 15.0);
}

/// Integration sub-step, seconds
const STEP: f32 = 1.0 / 1000.0;
/// Frames longer than this are treated as a stall and truncated
const MAX_FRAME: f32 = 0.25;

/// A spring over `N` independent channels
#[derive(Debug, Clone, PartialEq)]
pub struct Spring<const N: usize> {
    value: [f32; N],
    velocity: [f32; N],
    target: [f32; N],
    config: SpringConfig,
}

impl<const N: usize> Spring<N> {
    /// A spring at rest on `initial`
    pub fn new(initial: [f32; N], config: SpringConfig) -> Self {
        Self {
            value: initial,
            velocity: [0.0; N],
            target: initial,
            config,
        }
    }

    #[inline]
    pub fn current(&self) -> [f32; N] {
        self.value
    }

    pub fn set_target(&mut self, target: [f32; N]) {
        self.target = target;
    }

    pub fn is_at_rest(&self) -> bool {
        self.value == self.target && self.velocity.iter().all(|v| *v == 0.0)
    }

    /// Advance by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if self.is_at_rest() || dt <= 0.0 {
            return;
        }

        let SpringConfig {
            tension,
            friction,
            mass,
            precision,
        } = self.config;
        let mass = mass.max(f32::EPSILON);

        let mut remaining = dt.min(MAX_FRAME);
        while remaining > 0.0 {
            let h = remaining.min(STEP);
            for i in 0..N {
                let spring_force = -tension * (self.value[i] - self.target[i]);
                let damping_force = -friction * self.velocity[i];
                let accel = (spring_force + damping_force) / mass;
                self.velocity[i] += accel * h;
                self.value[i] += self.velocity[i] * h;
            }
            remaining -= h;
        }

        let settled = (0..N).all(|i| {
            (self.value[i] - self.target[i]).abs() < precision && self.velocity[i].abs() < precision
        });
        if settled {
            self.value = self.target;
            self.velocity = [0.0; N];
        }
    }
}

impl Spring<1> {
    #[inline]
    pub fn scalar(initial: f32, config: SpringConfig) -> Self {
        Self::new([initial], config)
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value[0]
    }

    #[inline]
    pub fn set_scalar_target(&mut self, target: f32) {
        self.target = [target];
    }
}
