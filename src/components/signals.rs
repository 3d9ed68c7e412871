// Per-entity blackboard read and written by behavior callbacks

use bevy_ecs::prelude::{Component, Entity};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Component, Default)]
pub struct Signals {
    pub scalars: FxHashMap<String, f32>,
    pub integers: FxHashMap<String, i32>,
    pub flags: FxHashSet<String>,
    pub entities: FxHashMap<String, Entity>,
}

impl Signals {
    pub fn with_scalar(mut self, key: impl Into<String>, value: f32) -> Self {
        self.set_scalar(key, value);
        self
    }
    pub fn with_integer(mut self, key: impl Into<String>, value: i32) -> Self {
        self.set_integer(key, value);
        self
    }
    pub fn with_entity(mut self, key: impl Into<String>, value: Entity) -> Self {
        self.set_entity(key, value);
        self
    }

    pub fn set_scalar(&mut self, key: impl Into<String>, value: f32) {
        self.scalars.insert(key.into(), value);
    }
    pub fn scalar(&self, key: &str) -> Option<f32> {
        self.scalars.get(key).copied()
    }
    pub fn set_integer(&mut self, key: impl Into<String>, value: i32) {
        self.integers.insert(key.into(), value);
    }
    pub fn integer(&self, key: &str) -> Option<i32> {
        self.integers.get(key).copied()
    }
    pub fn set_flag(&mut self, key: impl Into<String>) {
        self.flags.insert(key.into());
    }
    pub fn clear_flag(&mut self, key: &str) {
        self.flags.remove(key);
    }
    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }
    pub fn set_entity(&mut self, key: impl Into<String>, value: Entity) {
        self.entities.insert(key.into(), value);
    }
    pub fn entity(&self, key: &str) -> Option<Entity> {
        self.entities.get(key).copied()
    }
    pub fn clear_entity(&mut self, key: &str) -> Option<Entity> {
        self.entities.remove(key)
    }
}
