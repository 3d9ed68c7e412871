//! Vehicle capability.
//!
//! A [`Seatable`] entity can be boarded by one driver. While boarded the
//! driver is parked (idle, non-physical) and follows the vehicle; leaving
//! restores it next to the vehicle.

use bevy_ecs::prelude::{Component, Entity};

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Seatable {
    pub driver: Option<Entity>,
}

impl Seatable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Seat `driver`. Returns `false` when the seat is taken.
    pub fn board(&mut self, driver: Entity) -> bool {
        if self.driver.is_some() {
            return false;
        }
        self.driver = Some(driver);
        true
    }

    pub fn leave(&mut self) -> Option<Entity> {
        self.driver.take()
    }
}

/// Marks an entity that currently sits in `vehicle`.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seated {
    pub vehicle: Entity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    #[test]
    fn one_driver_at_a_time() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut seat = Seatable::new();
        assert!(seat.board(a));
        assert!(!seat.board(b));
        assert_eq!(seat.leave(), Some(a));
        assert!(!seat.has_driver());
    }
}
