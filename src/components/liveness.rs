use bevy_ecs::prelude::Component;

/// Interaction flags every simulated entity carries.
///
/// - `idle`: no longer interactive; skipped by the update pass and by
///   collision checks on both ends.
/// - `expired`: scheduled for removal at the next tick boundary.
/// - `frozen`: held by the user; the entity suspends its own propulsion.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Liveness {
    pub idle: bool,
    pub expired: bool,
    pub frozen: bool,
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes part in updates and collisions.
    pub fn is_active(&self) -> bool {
        !self.idle && !self.expired
    }
}
