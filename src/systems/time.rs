//! Tick clock.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per tick, applying `time_scale` to the provided delta, and
//! resets the per-tick collision/proximity ledger.
use bevy_ecs::prelude::*;

use crate::events::audio::AudioCmd;
use crate::events::collision::CollisionEvent;
use crate::resources::actorlist::TickLedger;
use crate::resources::worldtime::WorldTime;

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is expected to be the unscaled tick delta in seconds. The system
/// applies the current `time_scale` and writes both `elapsed` and `delta`.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
}

/// Start of a tick: advance the clock, forget last tick's pairs and rotate
/// the message buffers.
pub fn begin_tick(world: &mut World, dt: f32) {
    update_world_time(world, dt);
    if let Some(mut ledger) = world.get_resource_mut::<TickLedger>() {
        ledger.clear();
    }
    if let Some(mut msgs) = world.get_resource_mut::<Messages<AudioCmd>>() {
        msgs.update();
    }
    if let Some(mut msgs) = world.get_resource_mut::<Messages<CollisionEvent>>() {
        msgs.update();
    }
}

/// End of a tick.
pub fn end_tick(world: &mut World) {
    world.resource_mut::<WorldTime>().tick += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_delta_accumulates() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            time_scale: 0.5,
            ..Default::default()
        });
        world.init_resource::<TickLedger>();
        begin_tick(&mut world, 0.2);
        begin_tick(&mut world, 0.2);
        end_tick(&mut world);
        let wt = world.resource::<WorldTime>();
        assert!((wt.elapsed - 0.2).abs() < 1e-6);
        assert!((wt.delta - 0.1).abs() < 1e-6);
        assert_eq!(wt.tick, 1);
    }
}
