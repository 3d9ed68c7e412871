//! Axis-aligned bounding box used by the broad phase.
//!
//! The box is centered on the entity's [`MapPosition`](super::mapposition::MapPosition)
//! and is deliberately smaller than the sprite: half-extents are derived
//! from the sprite size times a shrink factor, which softens visual
//! collisions.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Default shrink applied to sprite sizes when building a collider.
pub const DEFAULT_SHRINK: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoxCollider {
    /// Half width and half height.
    pub half: Vec2,
    /// When true the entity initiates broad-phase checks during its turn.
    /// Passive colliders are only ever hit by others.
    pub probe: bool,
}

impl BoxCollider {
    /// Create a passive collider with explicit half-extents.
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half: Vec2::new(half_width.abs(), half_height.abs()),
            probe: false,
        }
    }

    /// Derive half-extents from a sprite size and a shrink factor.
    pub fn from_sprite(width: f32, height: f32, shrink: f32) -> Self {
        Self::new(width * shrink / 2.0, height * shrink / 2.0)
    }

    /// Mark this collider as an active prober.
    pub fn probing(mut self) -> Self {
        self.probe = true;
        self
    }

    /// Returns (min, max) corners for a given center.
    pub fn aabb(&self, center: Vec2) -> (Vec2, Vec2) {
        (center - self.half, center + self.half)
    }

    /// Strict separating-axis test. Touching edges do not intersect and a
    /// zero-sized box on either axis never intersects anything.
    pub fn overlaps(&self, center: Vec2, other: &Self, other_center: Vec2) -> bool {
        let d = (center - other_center).abs();
        let reach = self.half + other.half;
        if self.half.x <= 0.0 || self.half.y <= 0.0 || other.half.x <= 0.0 || other.half.y <= 0.0
        {
            return false;
        }
        d.x < reach.x && d.y < reach.y
    }

    /// Point containment in world space (edges inclusive).
    pub fn contains_point(&self, center: Vec2, point: Vec2) -> bool {
        let d = (point - center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }
}
