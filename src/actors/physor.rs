//! Point force source. Positive `magnitude` attracts, negative repels; it
//! is required. Bodies passing close enough to feel a strong pull make it
//! crackle, louder the stronger the pull.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::actors::SpawnParams;
use crate::components::boxcollider::BoxCollider;
use crate::components::forcesource::ForceSource;
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::phase::{Behavior, Phase};
use crate::components::signals::Signals;
use crate::components::sprite::Sprite;
use crate::context::EntityContext;
use crate::error::{Result, SimError};
use crate::events::collision::Collider;
use crate::resources::physics::ForceRegistry;

/// Cubed acceleration at which the crackle reaches full volume.
const FULL_VOLUME_ACCEL3: f32 = 900.0;

pub fn spawn(world: &mut World, pos: Vec2, params: &SpawnParams, shrink: f32) -> Result<Entity> {
    let magnitude = params.magnitude.ok_or(SimError::MissingParam {
        kind: "physor",
        param: "magnitude",
    })?;
    let source = ForceSource::new(magnitude).with_on_proximity(within_range);
    let sprite = if source.attracts() {
        Sprite::new("sphere", 40.0, 40.0)
    } else {
        Sprite::new("repulsor", 40.0, 40.0)
    };
    let entity = world
        .spawn((
            Kind::Physor,
            MapPosition { pos },
            Liveness::new(),
            BoxCollider::from_sprite(sprite.width, sprite.height, shrink),
            source,
            Signals::default(),
            Phase::stateless(Behavior::new().on_collision(on_collision)),
            sprite,
        ))
        .id();
    match world.get_resource_mut::<ForceRegistry>() {
        Some(mut registry) => {
            registry.register(entity);
        }
        None => log::warn!("no force registry, physor {:?} exerts no force", entity),
    }
    Ok(entity)
}

/// Crackle volume for a pull of `accel`.
pub fn static_volume(accel: f32) -> f32 {
    accel.powi(3).min(FULL_VOLUME_ACCEL3) / FULL_VOLUME_ACCEL3
}

fn within_range(ctx: &mut EntityContext, body: Entity, accel: f32) {
    if ctx.overlapping(body) {
        return;
    }
    ctx.play_sound("static", static_volume(accel));
}

fn on_collision(ctx: &mut EntityContext, other: &Collider) {
    let Some(e) = other.entity() else {
        return;
    };
    log::debug!(
        "physor {:?} collided with {:?}",
        ctx.entity(),
        ctx.kind_of(e)
    );
    if ctx.kind_of(e) == Some(Kind::Projectile) {
        ctx.play_sound("vortex", 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_saturates() {
        assert!((static_volume(3.0) - 0.03).abs() < 1e-6);
        assert_eq!(static_volume(10.0), 1.0);
    }
}
