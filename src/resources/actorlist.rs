//! Live entity list and per-tick bookkeeping.
//!
//! [`ActorList`] keeps the simulated entities in spawn order, which is also
//! the update order. Removal is deferred: handlers queue entities while the
//! list is being walked and [`compact_removals`] drops them at the tick
//! boundary.
//!
//! [`TickLedger`] remembers which collision pairs and proximity pairs were
//! already reported this tick.
//!
//! [`compact_removals`]: crate::systems::removal::compact_removals

use bevy_ecs::prelude::*;
use rustc_hash::FxHashSet;

#[derive(Resource, Debug, Default, Clone)]
pub struct ActorList {
    order: Vec<Entity>,
    pending: Vec<Entity>,
}

impl ActorList {
    pub fn push(&mut self, entity: Entity) {
        if !self.order.contains(&entity) {
            self.order.push(entity);
        }
    }

    /// Copy of the current order; entities spawned during the walk join the
    /// next tick.
    pub fn snapshot(&self) -> Vec<Entity> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.order.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Queue `entity` for removal. Returns `false` if already queued.
    pub fn queue_removal(&mut self, entity: Entity) -> bool {
        if self.pending.contains(&entity) {
            return false;
        }
        self.pending.push(entity);
        true
    }

    pub fn is_queued(&self, entity: Entity) -> bool {
        self.pending.contains(&entity)
    }

    /// Take the queued entities and drop them from the order.
    pub fn take_removals(&mut self) -> Vec<Entity> {
        let removed = std::mem::take(&mut self.pending);
        if !removed.is_empty() {
            self.order.retain(|e| !removed.contains(e));
        }
        removed
    }
}

fn ordered(a: Entity, b: Entity) -> (Entity, Entity) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Resource, Debug, Default, Clone)]
pub struct TickLedger {
    collided: FxHashSet<(Entity, Entity)>,
    proximity: FxHashSet<(Entity, Entity)>,
}

impl TickLedger {
    pub fn clear(&mut self) {
        self.collided.clear();
        self.proximity.clear();
    }

    /// Record an entity pair. `false` when it already collided this tick.
    pub fn mark_collision(&mut self, a: Entity, b: Entity) -> bool {
        self.collided.insert(ordered(a, b))
    }

    pub fn collided(&self, a: Entity, b: Entity) -> bool {
        self.collided.contains(&ordered(a, b))
    }

    /// Record a source/body proximity report. `false` when already reported.
    pub fn mark_proximity(&mut self, source: Entity, body: Entity) -> bool {
        self.proximity.insert((source, body))
    }
}
