//! Hovering decoration. Bobs around its anchor height; anything touching it
//! blows it out: it plays its dying animation, stops interacting and
//! expires once the animation is over.

use std::f32::consts::TAU;

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::actors::SpawnParams;
use crate::components::animation::{Animation, AnimationHandler, AnimationSpec, Animator, Frame};
use crate::components::boxcollider::BoxCollider;
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::phase::{Behavior, Phase};
use crate::components::signals::Signals;
use crate::components::sprite::Sprite;
use crate::context::EntityContext;
use crate::error::Result;
use crate::events::collision::Collider;
use crate::resources::worldtime::WorldTime;

pub const HOVER_STEP: f32 = 0.1;
pub const HOVER_AMPLITUDE: f32 = 2.0;
pub const DYING_FRAMES: u32 = 8;
pub const DYING_TIMING: f32 = 0.05;

pub fn spawn(world: &mut World, pos: Vec2, _params: &SpawnParams, shrink: f32) -> Result<Entity> {
    let now = world.get_resource::<WorldTime>().map_or(0.0, |t| t.elapsed);
    let mut animator: Animator<Frame, AnimationHandler> = Animator::new()
        .with(
            "standard",
            [Frame::new("lanternsmoke", 0)],
            AnimationSpec::timed(1.0),
        )
        .with(
            "dying",
            Frame::strip("lanternsmoke", DYING_FRAMES),
            AnimationSpec::once(DYING_TIMING),
        );
    animator.on_complete("dying", burned_out);
    animator.play("standard", now);

    let sprite = Sprite::new("lanternsmoke", 20.0, 18.0);
    let entity = world
        .spawn((
            Kind::Lantern,
            MapPosition { pos },
            Liveness::new(),
            BoxCollider::from_sprite(sprite.width, sprite.height, shrink),
            Signals::default()
                .with_scalar("anchor", pos.y)
                .with_scalar("hover", TAU * fastrand::f32()),
            Animation::new(animator),
            Phase::stateless(Behavior::new().update(update).on_collision(on_collision)),
            sprite,
        ))
        .id();
    Ok(entity)
}

fn update(ctx: &mut EntityContext) {
    let hover = (ctx.scalar("hover").unwrap_or(0.0) + HOVER_STEP).rem_euclid(TAU);
    ctx.set_scalar("hover", hover);
    let anchor = ctx.scalar("anchor").unwrap_or_else(|| ctx.position().y);
    let x = ctx.position().x;
    ctx.set_position(Vec2::new(x, anchor + HOVER_AMPLITUDE * hover.sin()));
}

fn on_collision(ctx: &mut EntityContext, _other: &Collider) {
    ctx.play_sound("puff", 1.0);
    ctx.play_animation("dying");
    ctx.set_idle(true);
}

fn burned_out(ctx: &mut EntityContext) {
    ctx.remove();
}
