//! World update pass.
//!
//! Walks the actor list in spawn order. Each active entity gets one full
//! turn before the next one starts:
//!
//! 1. entity collisions (probing colliders only),
//! 2. terrain contact and the terrain's response,
//! 3. its `update` behavior (which usually integrates physics),
//! 4. terrain cell membership.
//!
//! Transitions requested anywhere in the turn are applied right after the
//! callback that requested them. Entities spawned during the pass take their
//! first turn next tick.

use bevy_ecs::prelude::*;

use crate::components::liveness::Liveness;
use crate::components::phase::Phase;
use crate::resources::actorlist::ActorList;
use crate::resources::worldtime::WorldTime;
use crate::systems::collision::{check_entities, check_terrain, update_membership};
use crate::systems::phase::run_update;

fn is_active(world: &World, entity: Entity) -> bool {
    world.get::<Liveness>(entity).is_some_and(|l| l.is_active())
}

pub fn update_pass(world: &mut World) {
    let delta = world.get_resource::<WorldTime>().map_or(0.0, |t| t.delta);
    let entities = world
        .get_resource::<ActorList>()
        .map(|l| l.snapshot())
        .unwrap_or_default();

    for entity in entities {
        if !is_active(world, entity) {
            continue;
        }
        check_entities(world, entity);
        check_terrain(world, entity);
        if is_active(world, entity) {
            run_update(world, entity);
        }
        if let Some(mut phase) = world.get_mut::<Phase>(entity) {
            phase.time_in_state += delta;
        }
        update_membership(world, entity);
    }
}
