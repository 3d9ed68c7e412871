//! Keyboard capability.
//!
//! [`Controllable`] marks an entity that can be driven from the keyboard
//! while it is in its `controllable` state and maps logical actions to the
//! backend's key ids. The bindings mean nothing outside that state; the
//! selection layer ([`crate::selection::Selection`]) decides when an entity
//! enters it.

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

/// Name of the state every controllable kind defines.
pub const CONTROLLABLE_STATE: &str = "controllable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Jump,
    Fire,
}

#[derive(Component, Clone, Debug, Default)]
pub struct Controllable {
    bindings: FxHashMap<Action, u32>,
}

impl Controllable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, action: Action, key: u32) -> Self {
        self.bindings.insert(action, key);
        self
    }

    pub fn key(&self, action: Action) -> Option<u32> {
        self.bindings.get(&action).copied()
    }

    /// Action bound to `key`, if any.
    pub fn action_for(&self, key: u32) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(_, k)| **k == key)
            .map(|(action, _)| *action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_lookup_both_ways() {
        let c = Controllable::new().bind(Action::Left, 30).bind(Action::Fire, 57);
        assert_eq!(c.key(Action::Left), Some(30));
        assert_eq!(c.action_for(57), Some(Action::Fire));
        assert_eq!(c.action_for(1), None);
        assert_eq!(c.key(Action::Jump), None);
    }
}
