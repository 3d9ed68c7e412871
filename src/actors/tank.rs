//! Artillery tank.
//!
//! `facing` 1 (default) is the red tank on WASD + space, -1 the grey tank
//! on the arrows + enter, starting with its turret pointing left. In the
//! `controllable` state held keys turn the turret and change the shot power
//! and the fire key launches a projectile from the turret tip. Every
//! projectile hit costs 5 health and leaves a blast on the hull; at zero
//! health the tank burns out for good. Tanks never remove themselves.

use std::sync::{Arc, LazyLock};

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::actors::SpawnParams;
use crate::components::animation::{Animation, AnimationHandler, AnimationSpec, Animator, Frame};
use crate::components::animgroup::{Anchor, AnimGroup, GroupEntry};
use crate::components::boxcollider::BoxCollider;
use crate::components::inputcontrolled::{Action, Controllable, CONTROLLABLE_STATE};
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::phase::{Arg, Args, Behavior, Phase, StateDef, StateTable};
use crate::components::seatable::Seatable;
use crate::components::signals::Signals;
use crate::components::sprite::Sprite;
use crate::context::EntityContext;
use crate::error::Result;
use crate::events::collision::Collider;
use crate::resources::eventdispatcher::EventListeners;
use crate::resources::input::keys;
use crate::resources::terrain::{BLAST_FRAMES, BLAST_TIMING};
use crate::resources::worldtime::WorldTime;

pub const BURNED_STATE: &str = "burned";
pub const INITIAL_HEALTH: i32 = 100;
pub const INITIAL_POWER: i32 = 50;
pub const HIT_DAMAGE: i32 = 5;
pub const TURRET_LENGTH: f32 = 38.0;
const MUZZLE_FRAMES: u32 = 4;
const MUZZLE_TIMING: f32 = 0.06;

static STATES: LazyLock<Arc<StateTable>> = LazyLock::new(|| {
    Arc::new(
        StateTable::new()
            .state(
                CONTROLLABLE_STATE,
                StateDef::new()
                    .update(controlled_update)
                    .on_event(on_key),
            )
            .state(BURNED_STATE, StateDef::new().on_enter(burn)),
    )
});

struct Trim {
    hull: &'static str,
    turret: Vec2,
    controls: Controllable,
}

fn trim(facing: i32) -> Trim {
    if facing < 0 {
        Trim {
            hull: "gtank",
            turret: Vec2::new(25.0, 0.0),
            controls: Controllable::new()
                .bind(Action::Right, keys::RIGHT)
                .bind(Action::Left, keys::LEFT)
                .bind(Action::Up, keys::UP)
                .bind(Action::Down, keys::DOWN)
                .bind(Action::Fire, keys::ENTER),
        }
    } else {
        Trim {
            hull: "rtank",
            turret: Vec2::new(24.0, -7.0),
            controls: Controllable::new()
                .bind(Action::Right, keys::D)
                .bind(Action::Left, keys::A)
                .bind(Action::Up, keys::W)
                .bind(Action::Down, keys::S)
                .bind(Action::Fire, keys::SPACE),
        }
    }
}

pub fn spawn(world: &mut World, pos: Vec2, params: &SpawnParams, shrink: f32) -> Result<Entity> {
    let facing = if params.facing.unwrap_or(1) < 0 { -1 } else { 1 };
    let trim = trim(facing);
    let now = world.get_resource::<WorldTime>().map_or(0.0, |t| t.elapsed);

    let mut hull: Animator<Frame, AnimationHandler> = Animator::new()
        .with("standard", [Frame::new(trim.hull, 0)], AnimationSpec::timed(1.0))
        .with("burnedtank", [Frame::new("tankburned", 0)], AnimationSpec::timed(1.0));
    hull.play("standard", now);

    let mut turret: Animator<Frame, AnimationHandler> = Animator::new()
        .with("standard", [Frame::new("turret", 0)], AnimationSpec::timed(1.0))
        .with(
            "fire",
            Frame::strip("canblast", MUZZLE_FRAMES),
            AnimationSpec::once(MUZZLE_TIMING),
        );
    turret.play("standard", now);
    let mut group = AnimGroup::default();
    group.group.register(GroupEntry::new(
        "turret",
        Anchor::Owner(Vec2::new(facing as f32 * trim.turret.x, trim.turret.y)),
        0.55,
        turret,
    ));

    let sprite = Sprite::new(trim.hull, 64.0, 40.0).with_flip(facing < 0);
    let entity = world
        .spawn((
            Kind::Tank,
            MapPosition { pos },
            Liveness::new(),
            BoxCollider::from_sprite(sprite.width, sprite.height, shrink).probing(),
            trim.controls,
            Seatable::new(),
            Signals::default()
                .with_integer("facing", facing)
                .with_integer("health", INITIAL_HEALTH)
                .with_integer("power", INITIAL_POWER)
                .with_integer("angle", if facing < 0 { 180 } else { 0 })
                .with_scalar("turret_x", trim.turret.x)
                .with_scalar("turret_y", trim.turret.y),
            Animation::new(hull),
            group,
            Phase::new(
                Behavior::new().update(update).on_collision(on_collision),
                STATES.clone(),
            ),
            sprite,
        ))
        .id();
    if let Some(mut listeners) = world.get_resource_mut::<EventListeners>() {
        listeners.register("key_down", entity);
    }
    Ok(entity)
}

fn update(ctx: &mut EntityContext) {
    carry_driver(ctx);
}

/// The seated driver rides along.
fn carry_driver(ctx: &mut EntityContext) {
    let Some(driver) = ctx.get::<Seatable>().and_then(|s| s.driver) else {
        return;
    };
    let pos = ctx.position();
    if let Some(mut p) = ctx.world.get_mut::<MapPosition>(driver) {
        p.pos = pos;
    }
}

fn controlled_update(ctx: &mut EntityContext) {
    carry_driver(ctx);

    let mut turn = 0;
    if ctx.action_held(Action::Right) {
        turn += 1;
    }
    if ctx.action_held(Action::Left) {
        turn -= 1;
    }
    if turn != 0 {
        ctx.play_sound("turret", 0.2);
        let angle = ctx.integer("angle").unwrap_or(0);
        ctx.set_integer("angle", (angle + turn).rem_euclid(360));
    }

    let mut dv = 0;
    if ctx.action_held(Action::Up) {
        dv += 1;
    }
    if ctx.action_held(Action::Down) {
        dv -= 1;
    }
    if dv != 0 {
        let power = ctx.integer("power").unwrap_or(INITIAL_POWER);
        ctx.set_integer("power", (power + dv).rem_euclid(1000));
    }
}

fn on_key(ctx: &mut EntityContext, event: &str, args: &Args) {
    if event != "key_down" {
        return;
    }
    if let Some(Arg::Key(key)) = args.first() {
        if ctx.action_for_key(*key) == Some(Action::Fire) {
            shoot(ctx);
        }
    }
}

/// Where a shot leaves the barrel, relative to the hull centre.
pub fn muzzle_offset(facing: i32, turret: Vec2, angle_deg: f32) -> Vec2 {
    let rad = angle_deg.to_radians();
    Vec2::new(
        facing as f32 * turret.x + TURRET_LENGTH * rad.cos(),
        turret.y + TURRET_LENGTH * rad.sin(),
    )
}

fn shoot(ctx: &mut EntityContext) {
    let facing = ctx.integer("facing").unwrap_or(1);
    let angle = ctx.integer("angle").unwrap_or(0) as f32;
    let power = ctx.integer("power").unwrap_or(INITIAL_POWER) as f32;
    let turret = Vec2::new(
        ctx.scalar("turret_x").unwrap_or(0.0),
        ctx.scalar("turret_y").unwrap_or(0.0),
    );
    let at = ctx.position() + muzzle_offset(facing, turret, angle);
    let params = SpawnParams::new()
        .with_velocity(power)
        .with_angle(360.0 - angle)
        .with_owner(ctx.entity());
    if let Err(err) = ctx.spawn(Kind::Projectile, at, &params) {
        log::warn!("tank {:?} could not fire: {}", ctx.entity(), err);
        return;
    }

    let now = ctx.now();
    if let Some(mut group) = ctx.get_mut::<AnimGroup>() {
        if let Some(entry) = group.group.get_mut("turret") {
            entry.animator.play_queue(&["fire", "standard"], now);
        }
    }
    ctx.play_sound("tankshot", 1.0);
}

fn on_collision(ctx: &mut EntityContext, other: &Collider) {
    let Some(e) = other.entity() else {
        return;
    };
    if ctx.kind_of(e) != Some(Kind::Projectile) {
        return;
    }

    let health = ctx.integer("health").unwrap_or(0);
    let health = if health > 0 { health - HIT_DAMAGE } else { health };
    ctx.set_integer("health", health);
    if health <= 0 && ctx.current_state().as_deref() != Some(BURNED_STATE) {
        ctx.set_state(BURNED_STATE, Args::new());
    }

    let n = ctx.integer("blasts").unwrap_or(0) + 1;
    ctx.set_integer("blasts", n);
    let mut blast: Animator<Frame, AnimationHandler> = Animator::new().with(
        "blast",
        Frame::strip("blast", BLAST_FRAMES),
        AnimationSpec::once(BLAST_TIMING),
    );
    blast.play("blast", ctx.now());
    let at = ctx.position_of(e).unwrap_or_else(|| ctx.position());
    ctx.register_animation(GroupEntry::new(
        format!("blast{}", n),
        Anchor::World(at),
        0.7,
        blast,
    ));
    ctx.play_sound("tankexplode", 1.0);
}

fn burn(ctx: &mut EntityContext, _args: &Args) {
    log::debug!("tank {:?} burned out", ctx.entity());
    ctx.play_animation("burnedtank");
    ctx.unlisten("key_down");
}
