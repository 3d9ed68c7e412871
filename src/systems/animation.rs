//! Animation systems.
//!
//! - [`advance_entities`] steps every entity's main [`Animation`] and its
//!   [`AnimGroup`] side animations once, running completion handlers with an
//!   [`EntityContext`] of the owner.
//! - [`advance_tile_effects`] steps the effect groups of terrain cells; a
//!   retired blast damages the terrain where it played.
//!
//! Both are called once per render pass, against the world clock.
//!
//! # Related
//!
//! - [`crate::components::animation::Animator`] – the frame scheduler
//! - [`crate::components::animgroup::AnimationGroup`] – grouped animations
//! - [`crate::systems::render`] – consumes the frames

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::animation::{Animation, AnimationFrame, Frame};
use crate::components::animgroup::{AnimGroup, GroupFrame};
use crate::components::mapposition::MapPosition;
use crate::context::EntityContext;
use crate::resources::actorlist::ActorList;
use crate::resources::terrain::{Terrain, TileEffect};
use crate::resources::worldtime::WorldTime;
use crate::systems::phase::apply_transitions;

/// What one entity shows this pass.
#[derive(Debug, Clone)]
pub struct EntityFrames {
    pub entity: Entity,
    /// Frame of the main animation; `None` when the entity has no animation
    /// or it ran out.
    pub main: Option<Frame>,
    /// `true` when the entity carries an [`Animation`] at all.
    pub animated: bool,
    pub group: Vec<GroupFrame<Frame>>,
}

fn now(world: &World) -> f32 {
    world.get_resource::<WorldTime>().map_or(0.0, |t| t.elapsed)
}

/// Advance the animations of every listed entity, in update order.
pub fn advance_entities(world: &mut World) -> Vec<EntityFrames> {
    let now = now(world);
    let entities = world
        .get_resource::<ActorList>()
        .map(|l| l.snapshot())
        .unwrap_or_default();
    let mut out = Vec::with_capacity(entities.len());

    for entity in entities {
        if world.get_entity(entity).is_err() {
            continue;
        }
        let mut frames = EntityFrames {
            entity,
            main: None,
            animated: false,
            group: Vec::new(),
        };

        let step = world
            .get_mut::<Animation>(entity)
            .map(|mut anim| anim.advance(now));
        if let Some(step) = step {
            frames.animated = true;
            match step {
                AnimationFrame::Frame(frame) => frames.main = Some(frame),
                AnimationFrame::Completed(Some(handler)) => {
                    handler(&mut EntityContext::new(world, entity));
                    apply_transitions(world, entity);
                }
                AnimationFrame::Completed(None) | AnimationFrame::Empty => {}
            }
        }

        let owner = world
            .get::<MapPosition>(entity)
            .map_or(Vec2::ZERO, |p| p.pos);
        let pass = world
            .get_mut::<AnimGroup>(entity)
            .map(|mut g| g.group.advance(now, owner));
        if let Some(pass) = pass {
            frames.group = pass.visible;
            for retired in pass.retired {
                log::trace!("{:?} animation '{}' retired", entity, retired.name);
                if let Some(handler) = retired.handler {
                    handler(&mut EntityContext::new(world, entity));
                    apply_transitions(world, entity);
                }
            }
        }
        out.push(frames);
    }
    out
}

/// Advance every terrain cell's effects. Returns the visible effect frames.
pub fn advance_tile_effects(world: &mut World) -> Vec<GroupFrame<Frame>> {
    let now = now(world);
    let Some(mut terrain) = world.get_resource_mut::<Terrain>() else {
        return Vec::new();
    };
    let mut visible = Vec::new();
    let mut damage_at = Vec::new();
    for tile in terrain.tiles_mut() {
        if tile.effects.is_empty() {
            continue;
        }
        let pass = tile.effects.advance(now, tile.origin);
        visible.extend(pass.visible);
        for retired in pass.retired {
            if let Some(TileEffect::Damage) = retired.handler {
                damage_at.push(retired.pos);
            }
        }
    }
    for point in damage_at {
        terrain.damage(point);
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animation::{AnimationHandler, AnimationSpec, Animator};
    use crate::components::liveness::Liveness;
    use crate::resources::terrain::{AlphaMask, Tile, TileCoord};

    fn expire(ctx: &mut EntityContext) {
        ctx.remove();
    }

    fn world_at(t: f32) -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            elapsed: t,
            ..Default::default()
        });
        world.init_resource::<ActorList>();
        world
    }

    #[test]
    fn completion_handler_runs_once() {
        let mut world = world_at(0.0);
        let mut animator: Animator<Frame, AnimationHandler> = Animator::new().with(
            "dying",
            Frame::strip("puff", 2),
            AnimationSpec::once(0.1),
        );
        animator.on_complete("dying", expire);
        animator.play("dying", 0.0);
        let e = world
            .spawn((MapPosition::new(0.0, 0.0), Animation::new(animator), Liveness::new()))
            .id();
        world.resource_mut::<ActorList>().push(e);

        let frames = advance_entities(&mut world);
        assert_eq!(frames[0].main.as_ref().map(|f| f.index), Some(0));
        world.resource_mut::<WorldTime>().elapsed = 0.15;
        advance_entities(&mut world);
        assert!(!world.get::<Liveness>(e).unwrap().expired);
        world.resource_mut::<WorldTime>().elapsed = 0.3;
        let frames = advance_entities(&mut world);
        assert!(frames[0].main.is_none());
        assert!(world.get::<Liveness>(e).unwrap().expired);
        assert!(world.resource::<ActorList>().is_queued(e));
    }

    #[test]
    fn finished_blast_damages_cell() {
        let mut world = world_at(0.0);
        let mut terrain = Terrain::empty(1, 1, Vec2::new(100.0, 100.0), 0.0, 10.0);
        terrain.insert(Tile::new(
            TileCoord::new(0, 0),
            1,
            "t1",
            Vec2::ZERO,
            Box::new(AlphaMask::solid(100, 100)),
        ));
        terrain
            .tile_mut(TileCoord::new(0, 0))
            .unwrap()
            .start_blast(Vec2::new(50.0, 50.0), 0.0);
        world.insert_resource(terrain);

        let mut t = 0.0;
        let mut steps = 0;
        loop {
            world.resource_mut::<WorldTime>().elapsed = t;
            let visible = advance_tile_effects(&mut world);
            if visible.is_empty() {
                break;
            }
            steps += 1;
            t += 0.07;
            assert!(steps < 20, "blast never retired");
        }
        let terrain = world.resource::<Terrain>();
        assert!(terrain.check_collision(Vec2::new(50.0, 50.0)).is_none());
        assert!(terrain.check_collision(Vec2::new(5.0, 5.0)).is_some());
    }
}
