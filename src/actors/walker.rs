//! Keyboard-driven figure.
//!
//! Physics is applied one axis at a time and only toward open space, so the
//! walker slides along walls instead of sinking into them. In its
//! `controllable` state the arrow keys walk (5 px per tick, following the
//! slope) and jump (only from the ground, only with headroom). A walker can
//! board a vehicle through the selection layer.

use std::sync::{Arc, LazyLock};

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::actors::{inactive_state, SpawnParams, INACTIVE_STATE};
use crate::components::boxcollider::BoxCollider;
use crate::components::inputcontrolled::{Action, Controllable, CONTROLLABLE_STATE};
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::phase::{Behavior, Phase, StateDef, StateTable};
use crate::components::rigidbody::RigidBody;
use crate::components::signals::Signals;
use crate::components::sprite::Sprite;
use crate::context::EntityContext;
use crate::error::Result;
use crate::events::collision::Collider;
use crate::resources::input::keys;

pub const STEP: f32 = 5.0;
pub const JUMP_LIFT: f32 = 10.0;
pub const JUMP_VELOCITY: f32 = 60.0;
/// Drops deeper than this are fallen, not walked.
pub const MAX_HUG_DROP: f32 = 30.0;
/// Climb allowance per step as a fraction of the walker's height.
const HUG_CLIMB_DIVISOR: f32 = 12.0;

static STATES: LazyLock<Arc<StateTable>> = LazyLock::new(|| {
    Arc::new(
        StateTable::new()
            .state(CONTROLLABLE_STATE, StateDef::new().update(controlled_update))
            .state(INACTIVE_STATE, inactive_state()),
    )
});

pub fn spawn(world: &mut World, pos: Vec2, _params: &SpawnParams, shrink: f32) -> Result<Entity> {
    let sprite = Sprite::new("dude", 20.0, 36.0);
    let entity = world
        .spawn((
            Kind::Walker,
            MapPosition { pos },
            Liveness::new(),
            BoxCollider::from_sprite(sprite.width, sprite.height, shrink).probing(),
            RigidBody::new(),
            Controllable::new()
                .bind(Action::Left, keys::LEFT)
                .bind(Action::Right, keys::RIGHT)
                .bind(Action::Jump, keys::UP),
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
    apply_physics(ctx);
}

fn controlled_update(ctx: &mut EntityContext) {
    controls(ctx);
    apply_physics(ctx);
}

fn on_collision(ctx: &mut EntityContext, other: &Collider) {
    if other.tile().is_some() {
        ctx.reset_motion();
    }
}

fn controls(ctx: &mut EntityContext) {
    let half = ctx.size() / 2.0;
    if ctx.action_held(Action::Right) && !ctx.blocked(half.x, 0.0) {
        let p = ctx.position();
        ctx.set_position(p + Vec2::new(STEP, 0.0));
        ground_hug(ctx);
    }
    if ctx.action_held(Action::Left) && !ctx.blocked(-half.x, 0.0) {
        let p = ctx.position();
        ctx.set_position(p - Vec2::new(STEP, 0.0));
        ground_hug(ctx);
    }
    if ctx.action_held(Action::Jump) && !ctx.blocked(0.0, -half.y) && ctx.blocked(0.0, half.y) {
        let p = ctx.position();
        ctx.set_position(p - Vec2::new(0.0, JUMP_LIFT));
        if let Some(mut body) = ctx.body_mut() {
            body.init_velocity.y = JUMP_VELOCITY;
        }
    }
}

fn apply_physics(ctx: &mut EntityContext) {
    if ctx.is_frozen() {
        ctx.reset_physics();
        return;
    }
    let half = ctx.size() / 2.0;
    let pos = ctx.position();
    let next = ctx.integrate();

    // bumped the head: start falling right away
    if ctx.blocked(0.0, -half.y) {
        if let Some(mut body) = ctx.body_mut() {
            body.init_velocity.y = 0.0;
        }
    }

    let x_dir = if next.x > pos.x { 1.0 } else { -1.0 };
    let y_dir = if next.y > pos.y { 1.0 } else { -1.0 };
    if !ctx.blocked(x_dir * half.x, 0.0) {
        let y = ctx.position().y;
        ctx.set_position(Vec2::new(next.x, y));
        ground_hug(ctx);
    }
    if !ctx.blocked(0.0, y_dir * half.y) {
        let x = ctx.position().x;
        ctx.set_position(Vec2::new(x, next.y));
    }
    ctx.check_bounds();
}

/// Settle onto the ground under the walker: climb up to a twelfth of its
/// height, then step down until the feet touch. Drops deeper than
/// [`MAX_HUG_DROP`] are left to gravity. Only while not jumping.
fn ground_hug(ctx: &mut EntityContext) {
    let rising = ctx.body().is_some_and(|b| b.init_velocity.y != 0.0);
    if rising {
        return;
    }
    let half_h = ctx.size().y / 2.0;
    let start = ctx.position();
    let mut y = start.y - ctx.size().y / HUG_CLIMB_DIVISOR;
    loop {
        y += 1.0;
        if y - start.y > MAX_HUG_DROP {
            y = start.y;
            break;
        }
        if ctx.blocked(0.0, y - start.y + half_h) {
            break;
        }
    }
    ctx.set_position(Vec2::new(start.x, y));
}
