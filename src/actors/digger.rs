//! Drill that bores into the terrain it lands on.
//!
//! Falls under physics in base behavior. On terrain contact it enters
//! `digging` with the hit cell as entry argument, rattles in place for a
//! second and returns to base; leaving `digging` erases the terrain below
//! it, so it sinks a little deeper every cycle. Shots and other diggers
//! destroy it.

use std::sync::{Arc, LazyLock};

use bevy_ecs::prelude::*;
use glam::Vec2;
use smallvec::smallvec;

use crate::actors::{inactive_state, SpawnParams, INACTIVE_STATE};
use crate::components::boxcollider::BoxCollider;
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::phase::{Arg, Args, Behavior, Phase, StateDef, StateTable};
use crate::components::rigidbody::RigidBody;
use crate::components::signals::Signals;
use crate::components::sprite::Sprite;
use crate::context::EntityContext;
use crate::error::Result;
use crate::events::collision::Collider;

pub const DIGGING_STATE: &str = "digging";
pub const DIG_SECONDS: f32 = 1.0;
const DRILL_VOLUME: f32 = 0.05;

static STATES: LazyLock<Arc<StateTable>> = LazyLock::new(|| {
    Arc::new(
        StateTable::new()
            .state(
                DIGGING_STATE,
                StateDef::new()
                    .on_enter(dig_enter)
                    .on_exit(dig_exit)
                    .update(dig_update)
                    .on_collision(dig_collision),
            )
            .state(INACTIVE_STATE, inactive_state()),
    )
});

pub fn spawn(world: &mut World, pos: Vec2, _params: &SpawnParams, shrink: f32) -> Result<Entity> {
    let sprite = Sprite::new("drill3", 24.0, 32.0);
    let entity = world
        .spawn((
            Kind::Digger,
            MapPosition { pos },
            Liveness::new(),
            BoxCollider::from_sprite(sprite.width, sprite.height, shrink).probing(),
            RigidBody::new(),
            Signals::default(),
            Phase::new(
                Behavior::new().update(update).on_collision(on_collision),
                STATES.clone(),
            ),
            sprite,
        ))
        .id();
    Ok(entity)
}

fn update(ctx: &mut EntityContext) {
    if ctx.is_frozen() {
        ctx.reset_physics();
        return;
    }
    ctx.step_physics();
    ctx.check_bounds();
}

fn on_collision(ctx: &mut EntityContext, other: &Collider) {
    match other {
        Collider::Tile(hit) => {
            ctx.set_state(DIGGING_STATE, smallvec![Arg::Tile(hit.coord)]);
        }
        Collider::Entity(e) => hit_by(ctx, *e),
    }
}

fn hit_by(ctx: &mut EntityContext, other: Entity) {
    if matches!(ctx.kind_of(other), Some(Kind::Projectile | Kind::Digger)) {
        ctx.play_sound("bullet", 1.0);
        ctx.remove();
    }
}

fn dig_enter(ctx: &mut EntityContext, args: &Args) {
    if let Some(Arg::Tile(coord)) = args.first() {
        log::trace!("{:?} digging into cell {:?}", ctx.entity(), coord);
    }
    let y = ctx.position().y;
    ctx.set_scalar("anchor_y", y);
    ctx.register_timer("dig", DIG_SECONDS, dig_done, false);
}

fn dig_done(ctx: &mut EntityContext) {
    ctx.clear_state();
}

fn dig_update(ctx: &mut EntityContext) {
    // let go when the user grabs it
    if ctx.is_frozen() {
        ctx.clear_state();
        return;
    }
    let anchor = ctx.scalar("anchor_y").unwrap_or_else(|| ctx.position().y);
    let x = ctx.position().x;
    ctx.set_position(Vec2::new(x, anchor + fastrand::u32(0..4) as f32));
    ctx.play_sound("drill", DRILL_VOLUME);
}

// resting on the terrain it is eating; only entities matter here
fn dig_collision(ctx: &mut EntityContext, other: &Collider) {
    if let Collider::Entity(e) = other {
        hit_by(ctx, *e);
    }
}

fn dig_exit(ctx: &mut EntityContext) {
    ctx.unregister_timer("dig");
    let half_h = ctx.size().y / 2.0;
    let below = ctx.position() + Vec2::new(0.0, half_h);
    ctx.damage_terrain(below);
    let anchor = ctx.scalar("anchor_y").unwrap_or_else(|| ctx.position().y);
    let x = ctx.position().x;
    ctx.set_position(Vec2::new(x, anchor));
    ctx.reset_physics();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_defined() {
        assert!(STATES.contains(DIGGING_STATE));
        assert!(STATES.contains(INACTIVE_STATE));
    }
}
