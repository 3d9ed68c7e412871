//! Ballistic shot.
//!
//! Needs `velocity`; `angle` defaults to 0 (straight right). Removes itself
//! on its first collision of any sort and tells its owner what it hit.
//! Landing on terrain starts a blast there. A fuse removes shots that never
//! land.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::actors::SpawnParams;
use crate::components::boxcollider::BoxCollider;
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::phase::{Behavior, Phase};
use crate::components::rigidbody::RigidBody;
use crate::components::signals::Signals;
use crate::components::sprite::Sprite;
use crate::components::terrainimpact::TerrainImpact;
use crate::context::EntityContext;
use crate::error::{Result, SimError};
use crate::events::collision::Collider;

pub const FUSE_SECONDS: f32 = 10.0;
/// Health an owning tank gains when its shot hits a lantern.
pub const LANTERN_BONUS: i32 = 5;

pub fn spawn(world: &mut World, pos: Vec2, params: &SpawnParams, shrink: f32) -> Result<Entity> {
    let velocity = params.velocity.ok_or(SimError::MissingParam {
        kind: "projectile",
        param: "velocity",
    })?;
    let angle = params.angle.unwrap_or(0.0);

    let mut signals = Signals::default();
    match params.owner {
        Some(owner) if world.get_entity(owner).is_ok() => signals.set_entity("owner", owner),
        Some(owner) => log::warn!("projectile owner {:?} does not exist, ignored", owner),
        None => {}
    }

    let sprite = Sprite::new("ball", 10.0, 10.0).with_z(0.6);
    let entity = world
        .spawn((
            Kind::Projectile,
            MapPosition { pos },
            Liveness::new(),
            BoxCollider::from_sprite(sprite.width, sprite.height, shrink).probing(),
            RigidBody::launched(velocity, angle),
            TerrainImpact::Blast,
            signals,
            Phase::stateless(Behavior::new().update(update).on_collision(on_collision)),
            sprite,
        ))
        .id();
    EntityContext::new(world, entity).register_timer("fuse", FUSE_SECONDS, fuse, false);
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
    if let Some(owner) = ctx.linked("owner") {
        notify_owner(ctx, owner, other);
    }
    if let Some(e) = other.entity() {
        if ctx.kind_of(e) == Some(Kind::Projectile) {
            ctx.play_sound("bullet", 1.0);
        }
    }
    ctx.remove();
}

fn notify_owner(ctx: &mut EntityContext, owner: Entity, other: &Collider) {
    let hit_kind = other.entity().and_then(|e| ctx.kind_of(e));
    log::debug!(
        "{:?}'s projectile {:?} hit {:?}",
        owner,
        ctx.entity(),
        hit_kind.map_or("terrain", |k| k.name())
    );
    if hit_kind != Some(Kind::Lantern) || ctx.kind_of(owner) != Some(Kind::Tank) {
        return;
    }
    if let Some(mut signals) = ctx.world.get_mut::<Signals>(owner) {
        let health = signals.integer("health").unwrap_or(0);
        signals.set_integer("health", health + LANTERN_BONUS);
    }
}

fn fuse(ctx: &mut EntityContext) {
    log::debug!("projectile {:?} fuse ran out", ctx.entity());
    ctx.remove();
}
