//! Collision participants and notifications.
//!
//! [`Collider`] is what an `on_collision` behavior receives: either another
//! entity or a terrain cell hit at a point. Every dispatched collision is
//! also written as a [`CollisionEvent`] message for outer layers (HUD,
//! statistics) that want to observe without owning a behavior.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

use crate::resources::terrain::TileHit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Entity(Entity),
    Tile(TileHit),
}

impl Collider {
    pub fn entity(&self) -> Option<Entity> {
        match self {
            Collider::Entity(e) => Some(*e),
            Collider::Tile(_) => None,
        }
    }

    pub fn tile(&self) -> Option<&TileHit> {
        match self {
            Collider::Tile(hit) => Some(hit),
            Collider::Entity(_) => None,
        }
    }
}

/// `entity` collided with `other` this tick.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub entity: Entity,
    pub other: Collider,
}
