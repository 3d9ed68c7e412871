//! Timer firing.
//!
//! Walks every entity carrying [`Timers`], collects the due entries against
//! the world clock and runs their actions through an [`EntityContext`].
//! Actions of entities that vanished in the meantime are skipped with a
//! warning.

use bevy_ecs::prelude::*;

use crate::components::liveness::Liveness;
use crate::components::timer::Timers;
use crate::context::EntityContext;
use crate::resources::worldtime::WorldTime;
use crate::systems::phase::apply_transitions;

pub fn update_timers(world: &mut World) {
    let now = world.resource::<WorldTime>().elapsed;
    let mut due = Vec::new();
    let mut query = world.query::<(Entity, &mut Timers)>();
    for (entity, mut timers) in query.iter_mut(world) {
        if timers.is_empty() {
            continue;
        }
        for (name, action) in timers.update(now) {
            due.push((entity, name, action));
        }
    }

    for (entity, name, action) in due {
        let expired = world.get::<Liveness>(entity).is_some_and(|l| l.expired);
        if expired || world.get_entity(entity).is_err() {
            log::warn!("timer '{}' fired for vanished entity {:?}", name, entity);
            continue;
        }
        log::trace!("timer '{}' fired on {:?}", name, entity);
        action(&mut EntityContext::new(world, entity));
        apply_transitions(world, entity);
    }
}
