//! Deferred removal.
//!
//! Handlers never despawn directly; they mark the entity expired and queue
//! it on the [`ActorList`]. [`compact_removals`] runs at the tick boundary,
//! detaches every queued entity from the world-level registries that may
//! still name it and despawns it.

use bevy_ecs::prelude::*;

use crate::components::liveness::Liveness;
use crate::components::rigidbody::RigidBody;
use crate::components::seatable::{Seatable, Seated};
use crate::resources::actorlist::ActorList;
use crate::resources::eventdispatcher::EventListeners;
use crate::resources::physics::ForceRegistry;
use crate::resources::terrain::Terrain;

/// Returns how many entities were despawned.
pub fn compact_removals(world: &mut World) -> usize {
    let removed = match world.get_resource_mut::<ActorList>() {
        Some(mut list) => list.take_removals(),
        None => return 0,
    };
    let mut count = 0;
    for entity in removed {
        detach(world, entity);
        if world.despawn(entity) {
            count += 1;
            log::debug!("{:?} despawned", entity);
        }
    }
    count
}

fn detach(world: &mut World, entity: Entity) {
    if let Some(mut terrain) = world.get_resource_mut::<Terrain>() {
        terrain.detach(entity);
    }
    if let Some(mut listeners) = world.get_resource_mut::<EventListeners>() {
        listeners.unregister_all(&entity);
    }
    if let Some(mut registry) = world.get_resource_mut::<ForceRegistry>() {
        registry.unregister(entity);
    }

    // a vehicle going away drops its driver back into the world
    let driver = world
        .get_mut::<Seatable>(entity)
        .and_then(|mut seat| seat.leave());
    if let Some(driver) = driver {
        if let Ok(mut e) = world.get_entity_mut(driver) {
            e.remove::<Seated>();
        }
        if let Some(mut l) = world.get_mut::<Liveness>(driver) {
            l.idle = false;
        }
        if let Some(mut body) = world.get_mut::<RigidBody>(driver) {
            body.physical = true;
            body.reset_motion();
        }
    }
    // a driver going away frees its seat
    let Some(vehicle) = world.get::<Seated>(entity).map(|s| s.vehicle) else {
        return;
    };
    if let Some(mut seat) = world.get_mut::<Seatable>(vehicle) {
        if seat.driver == Some(entity) {
            seat.driver = None;
        }
    }
}
