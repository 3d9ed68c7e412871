//! Collision checks for one entity's turn.
//!
//! - [`check_entities`] runs the box broad phase of a probing entity against
//!   every other active entity, refined by a pixel-mask test when one side
//!   carries a [`PixelMask`] and the other is a projectile.
//! - [`check_terrain`] probes the terrain under a physical entity and applies
//!   its [`TerrainImpact`].
//! - [`update_membership`] keeps terrain occupant lists in sync.
//!
//! Both parties of an entity collision get their collision behavior called,
//! once per pair per tick.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::boxcollider::BoxCollider;
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::pixelmask::PixelMask;
use crate::components::rigidbody::RigidBody;
use crate::components::sprite::Sprite;
use crate::components::terrainimpact::TerrainImpact;
use crate::components::tilemember::TileMember;
use crate::context::EntityContext;
use crate::events::collision::Collider;
use crate::resources::actorlist::{ActorList, TickLedger};
use crate::resources::terrain::{Terrain, TileHit};
use crate::systems::phase::run_collision;

fn is_active(world: &World, entity: Entity) -> bool {
    world.get::<Liveness>(entity).is_some_and(|l| l.is_active())
}

/// Pixel refinement. `true` when neither side needs it.
fn pixel_gate(world: &World, a: Entity, pa: Vec2, b: Entity, pb: Vec2) -> bool {
    let refine = |owner: Entity, at: Vec2, other: Entity, point: Vec2| -> Option<bool> {
        let mask = world.get::<PixelMask>(owner)?;
        if world.get::<Kind>(other) != Some(&Kind::Projectile) {
            return None;
        }
        let flip = world.get::<Sprite>(owner).is_some_and(|s| s.flip_h);
        Some(mask.hit(at, point, flip))
    };
    refine(a, pa, b, pb)
        .or_else(|| refine(b, pb, a, pa))
        .unwrap_or(true)
}

/// Box overlap of `entity` against every other active entity. Only probing
/// colliders search; a pair is reported once per tick whichever side found
/// it. Stops as soon as `entity` stops being active; its pairs with
/// entities later in the list are then dropped for this tick, since
/// inactive entities are skipped from both sides.
pub fn check_entities(world: &mut World, entity: Entity) {
    let probing = world.get::<BoxCollider>(entity).is_some_and(|b| b.probe);
    if !probing {
        return;
    }
    let candidates = world.resource::<ActorList>().snapshot();
    for other in candidates {
        if other == entity {
            continue;
        }
        if !is_active(world, entity) {
            break;
        }
        if !is_active(world, other) {
            continue;
        }
        let (Some(a), Some(b)) = (
            world.get::<BoxCollider>(entity),
            world.get::<BoxCollider>(other),
        ) else {
            continue;
        };
        let (Some(pa), Some(pb)) = (
            world.get::<MapPosition>(entity).map(|p| p.pos),
            world.get::<MapPosition>(other).map(|p| p.pos),
        ) else {
            continue;
        };
        if !a.overlaps(pa, b, pb) || !pixel_gate(world, entity, pa, other, pb) {
            continue;
        }
        if !world.resource_mut::<TickLedger>().mark_collision(entity, other) {
            continue;
        }
        log::trace!("collision {:?} <-> {:?}", entity, other);
        run_collision(world, entity, Collider::Entity(other));
        run_collision(world, other, Collider::Entity(entity));
    }
}

/// Probe the terrain at the bottom centre of a physical entity. On contact
/// the entity's collision behavior runs first, then the terrain reacts
/// according to its [`TerrainImpact`].
pub fn check_terrain(world: &mut World, entity: Entity) -> Option<TileHit> {
    if !is_active(world, entity) {
        return None;
    }
    if !world.get::<RigidBody>(entity).is_some_and(|b| b.physical) {
        return None;
    }
    let pos = world.get::<MapPosition>(entity)?.pos;
    let half_h = world.get::<Sprite>(entity).map_or(0.0, |s| s.half_height());
    let hit = world
        .get_resource::<Terrain>()?
        .check_collision(pos + Vec2::new(0.0, half_h))?;

    run_collision(world, entity, Collider::Tile(hit));

    let impact = world
        .get::<TerrainImpact>(entity)
        .copied()
        .unwrap_or_default();
    match impact {
        TerrainImpact::Blast => {
            let mut ctx = EntityContext::new(world, entity);
            ctx.play_sound("thud", 1.0);
            ctx.blast_terrain(hit.coord, pos);
        }
        TerrainImpact::None => {}
    }
    Some(hit)
}

/// Move the entity into the occupant list of the cell under it.
pub fn update_membership(world: &mut World, entity: Entity) {
    let Some(pos) = world.get::<MapPosition>(entity).map(|p| p.pos) else {
        return;
    };
    let from = world.get::<TileMember>(entity).and_then(|m| m.cell);
    let to = match world.get_resource_mut::<Terrain>() {
        Some(mut terrain) => terrain.relocate(entity, from, pos),
        None => return,
    };
    if to != from {
        if let Ok(mut e) = world.get_entity_mut(entity) {
            e.insert(TileMember { cell: to });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::phase::{Behavior, Phase};
    use crate::components::signals::Signals;
    use crate::resources::terrain::{AlphaMask, Tile, TileCoord};

    fn count_hits(ctx: &mut EntityContext, _: &Collider) {
        let n = ctx.integer("hits").unwrap_or(0);
        ctx.set_integer("hits", n + 1);
    }

    fn body(world: &mut World, x: f32, y: f32, probe: bool) -> Entity {
        let mut collider = BoxCollider::new(5.0, 5.0);
        collider.probe = probe;
        let e = world
            .spawn((
                MapPosition::new(x, y),
                collider,
                Liveness::new(),
                Signals::default(),
                Phase::stateless(Behavior::new().on_collision(count_hits)),
            ))
            .id();
        world.resource_mut::<ActorList>().push(e);
        e
    }

    fn setup() -> World {
        let mut world = World::new();
        world.init_resource::<ActorList>();
        world.init_resource::<TickLedger>();
        world
    }

    fn hits(world: &World, e: Entity) -> i32 {
        world.get::<Signals>(e).unwrap().integer("hits").unwrap_or(0)
    }

    #[test]
    fn pair_reported_once_to_both_sides() {
        let mut world = setup();
        let a = body(&mut world, 0.0, 0.0, true);
        let b = body(&mut world, 4.0, 0.0, true);
        check_entities(&mut world, a);
        check_entities(&mut world, b);
        assert_eq!(hits(&world, a), 1);
        assert_eq!(hits(&world, b), 1);
    }

    fn hit_once_then_idle(ctx: &mut EntityContext, other: &Collider) {
        count_hits(ctx, other);
        ctx.set_idle(true);
    }

    #[test]
    fn prober_going_idle_drops_later_pairs() {
        let mut world = setup();
        let a = body(&mut world, 0.0, 0.0, true);
        world
            .entity_mut(a)
            .insert(Phase::stateless(Behavior::new().on_collision(hit_once_then_idle)));
        let b = body(&mut world, 4.0, 0.0, false);
        let c = body(&mut world, -4.0, 0.0, false);
        check_entities(&mut world, a);
        assert_eq!(hits(&world, a), 1);
        assert_eq!(hits(&world, b), 1);
        assert_eq!(hits(&world, c), 0);
    }

    #[test]
    fn non_probing_entities_do_not_search() {
        let mut world = setup();
        let a = body(&mut world, 0.0, 0.0, false);
        let _b = body(&mut world, 4.0, 0.0, false);
        check_entities(&mut world, a);
        assert_eq!(hits(&world, a), 0);
    }

    #[test]
    fn pixel_mask_filters_projectiles() {
        let mut world = setup();
        let target = body(&mut world, 0.0, 0.0, true);
        let mut mask = AlphaMask::transparent(10, 10);
        mask.set(9, 9, 255);
        world
            .entity_mut(target)
            .insert((PixelMask::new(mask), Sprite::new("t", 10.0, 10.0)));
        let shot = body(&mut world, 1.0, 1.0, true);
        world.entity_mut(shot).insert(Kind::Projectile);
        check_entities(&mut world, target);
        assert_eq!(hits(&world, target), 0);
    }

    fn solid_cell(world: &mut World) {
        let mut terrain = Terrain::empty(1, 1, Vec2::new(100.0, 100.0), 0.0, 10.0);
        terrain.insert(Tile::new(
            TileCoord::new(0, 0),
            1,
            "t1",
            Vec2::ZERO,
            Box::new(AlphaMask::solid(100, 100)),
        ));
        world.insert_resource(terrain);
    }

    #[test]
    fn terrain_contact_follows_impact_policy() {
        let mut world = setup();
        solid_cell(&mut world);
        let plain = body(&mut world, 50.0, 40.0, false);
        world.entity_mut(plain).insert(RigidBody::new());
        let shot = body(&mut world, 20.0, 40.0, false);
        world
            .entity_mut(shot)
            .insert((RigidBody::new(), TerrainImpact::Blast));

        // no policy: the entity hears about it, the cell does nothing
        assert!(check_terrain(&mut world, plain).is_some());
        assert_eq!(hits(&world, plain), 1);
        let cell = TileCoord::new(0, 0);
        assert!(world.resource::<Terrain>().tile(cell).unwrap().effects.is_empty());

        assert!(check_terrain(&mut world, shot).is_some());
        assert_eq!(hits(&world, shot), 1);
        assert_eq!(world.resource::<Terrain>().tile(cell).unwrap().effects.len(), 1);
        // damage waits for the blast to finish
        assert!(world.resource::<Terrain>().check_collision(Vec2::new(20.0, 40.0)).is_some());
    }

    #[test]
    fn membership_follows_position() {
        let mut world = setup();
        let mut terrain = Terrain::empty(2, 1, Vec2::new(100.0, 100.0), 0.0, 10.0);
        for col in 0..2 {
            let coord = TileCoord::new(col, 0);
            let origin = terrain.map_to_screen(coord);
            terrain.insert(Tile::new(
                coord,
                1,
                "t1",
                origin,
                Box::new(AlphaMask::solid(100, 100)),
            ));
        }
        world.insert_resource(terrain);
        let e = body(&mut world, 10.0, 10.0, false);
        update_membership(&mut world, e);
        assert_eq!(world.resource::<Terrain>().occupants(TileCoord::new(0, 0)), &[e]);

        world.get_mut::<MapPosition>(e).unwrap().pos.x = 150.0;
        update_membership(&mut world, e);
        let terrain = world.resource::<Terrain>();
        assert!(terrain.occupants(TileCoord::new(0, 0)).is_empty());
        assert_eq!(terrain.occupants(TileCoord::new(1, 0)), &[e]);
    }
}
