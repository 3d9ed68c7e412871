//! Keyboard state fed by the input-polling layer.
//!
//! The core never polls hardware; the outer loop forwards key presses and
//! releases through
//! [`Simulation::on_input_event`](crate::game::Simulation::on_input_event)
//! and behaviors read the held set from here.
use bevy_ecs::prelude::*;
use rustc_hash::FxHashSet;

/// Backend key ids used by the built-in control presets.
pub mod keys {
    pub const SPACE: u32 = 32;
    pub const A: u32 = 65;
    pub const D: u32 = 68;
    pub const S: u32 = 83;
    pub const W: u32 = 87;
    pub const ENTER: u32 = 257;
    pub const RIGHT: u32 = 262;
    pub const LEFT: u32 = 263;
    pub const DOWN: u32 = 264;
    pub const UP: u32 = 265;
}

#[derive(Resource, Debug, Clone, Default)]
pub struct InputState {
    held: FxHashSet<u32>,
}

impl InputState {
    /// Returns `true` on the transition from released to held.
    pub fn press(&mut self, key: u32) -> bool {
        self.held.insert(key)
    }

    pub fn release(&mut self, key: u32) -> bool {
        self.held.remove(&key)
    }

    pub fn is_held(&self, key: u32) -> bool {
        self.held.contains(&key)
    }

    pub fn any_held(&self) -> bool {
        !self.held.is_empty()
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}
