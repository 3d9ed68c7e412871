//! Built-in entity kinds and the spawn entry point.
//!
//! Every kind module exposes `spawn(world, pos, params, shrink)` building
//! the component bundle and the behavior tables of that kind. [`spawn`]
//! dispatches on [`Kind`], checks the required parameters and appends the
//! entity to the update order.
//!
//! Submodules overview:
//! - [`projectile`] – ballistic shot with a blast impact and a fuse
//! - [`digger`] – drills into terrain it lands on
//! - [`walker`] – keyboard-driven figure hugging the ground
//! - [`lantern`] – hovering decoration that puffs out when touched
//! - [`physor`] – attractive or repulsive force source
//! - [`tank`] – turret vehicle firing projectiles

pub mod digger;
pub mod lantern;
pub mod physor;
pub mod projectile;
pub mod tank;
pub mod walker;

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::kind::Kind;
use crate::components::phase::StateDef;
use crate::context::EntityContext;
use crate::error::Result;
use crate::resources::actorlist::ActorList;
use crate::resources::gameconfig::GameConfig;

/// Construction parameters. Which fields a kind needs is documented on the
/// kind's module; missing required ones fail the spawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    /// Launch speed (projectile).
    pub velocity: Option<f32>,
    /// Launch angle in degrees, 0 = right, 90 = up (projectile).
    pub angle: Option<f32>,
    /// Field strength, negative repels (physor).
    pub magnitude: Option<f32>,
    /// 1 faces right, -1 faces left (tank).
    pub facing: Option<i32>,
    /// Entity told about the projectile's collisions.
    #[serde(skip)]
    pub owner: Option<Entity>,
}

impl SpawnParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = Some(angle);
        self
    }

    pub fn with_magnitude(mut self, magnitude: f32) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    pub fn with_facing(mut self, facing: i32) -> Self {
        self.facing = Some(facing);
        self
    }

    pub fn with_owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// State a physical kind rests in while the user holds it.
pub const INACTIVE_STATE: &str = "inactive";

// held entities stay put but still show up to nearby force sources
fn inactive_update(ctx: &mut EntityContext) {
    ctx.field();
}

pub(crate) fn inactive_state() -> StateDef {
    StateDef::new().update(inactive_update)
}

/// Spawn a built-in kind at `pos`. The entity takes its first turn on the
/// next tick.
pub fn spawn(world: &mut World, kind: Kind, pos: Vec2, params: &SpawnParams) -> Result<Entity> {
    let shrink = world
        .get_resource::<GameConfig>()
        .map_or(0.7, |c| c.bounding_shrink);
    let entity = match kind {
        Kind::Projectile => projectile::spawn(world, pos, params, shrink)?,
        Kind::Digger => digger::spawn(world, pos, params, shrink)?,
        Kind::Walker => walker::spawn(world, pos, params, shrink)?,
        Kind::Lantern => lantern::spawn(world, pos, params, shrink)?,
        Kind::Physor => physor::spawn(world, pos, params, shrink)?,
        Kind::Tank => tank::spawn(world, pos, params, shrink)?,
    };
    if let Some(mut list) = world.get_resource_mut::<ActorList>() {
        list.push(entity);
    }
    log::debug!(
        "spawned {} {:?} at ({:.0}, {:.0})",
        kind.name(),
        entity,
        pos.x,
        pos.y
    );
    Ok(entity)
}
