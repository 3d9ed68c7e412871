use bevy_ecs::prelude::{Component, Entity};

use crate::context::EntityContext;

/// Called on the source entity when a body comes close enough to feel a
/// strong pull: `(ctx, body, acceleration_magnitude)`.
pub type ProximityCallback = fn(&mut EntityContext, Entity, f32);

/// Point emitting an attractive (`magnitude > 0`) or repulsive field.
///
/// The component only carries the parameters; registration in the shared
/// [`ForceRegistry`](crate::resources::physics::ForceRegistry) is what makes
/// the field act on bodies.
#[derive(Component, Clone, Copy, Debug)]
pub struct ForceSource {
    pub magnitude: f32,
    pub on_proximity: Option<ProximityCallback>,
}

impl ForceSource {
    pub fn new(magnitude: f32) -> Self {
        Self {
            magnitude,
            on_proximity: None,
        }
    }

    pub fn with_on_proximity(mut self, callback: ProximityCallback) -> Self {
        self.on_proximity = Some(callback);
        self
    }

    pub fn attracts(&self) -> bool {
        self.magnitude > 0.0
    }
}
