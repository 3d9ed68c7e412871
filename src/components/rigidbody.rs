//! Per-entity physics state consumed by the integrator.
//!
//! The integrator in [`crate::resources::physics`] is stateless apart from
//! the accumulated time `time` stored here. Launch velocity is kept as
//! "initial velocity" components rather than a running velocity because
//! displacement is derived from the time since the last reset.
//!
//! Sign convention: positive `init_velocity.y` points *up* (it is
//! subtracted from screen-space y), gravity points down.

use bevy_ecs::prelude::Component;
use glam::Vec2;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct RigidBody {
    /// Participates in integration. When false `integrate` returns the
    /// current position unchanged.
    pub physical: bool,
    /// Ignore force sources and use gravity alone.
    pub gravity_only: bool,
    /// Physics time accumulated since the last reset, in seconds.
    pub time: f32,
    /// Launch velocity (x to the right, y up).
    pub init_velocity: Vec2,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// A physical body at rest.
    pub fn new() -> Self {
        Self {
            physical: true,
            gravity_only: false,
            time: 0.0,
            init_velocity: Vec2::ZERO,
        }
    }

    /// A physical body launched with `speed` at `angle_deg` (0 = right,
    /// 90 = straight up).
    pub fn launched(speed: f32, angle_deg: f32) -> Self {
        let rad = angle_deg.to_radians();
        Self {
            init_velocity: Vec2::new(speed * rad.cos(), speed * rad.sin()),
            ..Self::new()
        }
    }

    pub fn with_gravity_only(mut self, gravity_only: bool) -> Self {
        self.gravity_only = gravity_only;
        self
    }

    pub fn toggle_physics(&mut self) {
        self.physical = !self.physical;
    }

    pub fn toggle_gravity_only(&mut self) {
        self.gravity_only = !self.gravity_only;
    }

    /// Zero the time origin. Launch velocity is untouched.
    pub fn reset_time(&mut self) {
        self.time = 0.0;
    }

    /// Zero the time origin and the launch velocity (landing / moving
    /// entities).
    pub fn reset_motion(&mut self) {
        self.time = 0.0;
        self.init_velocity = Vec2::ZERO;
    }
}
