//! Sound effect requests.
//!
//! The core never plays audio. Behaviors write [`AudioCmd`] messages and the
//! audio backend drains them once per frame through
//! [`Simulation::drain_audio`](crate::game::Simulation::drain_audio).

use bevy_ecs::message::Message;

#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioCmd {
    /// Play a loaded effect once at `volume` (0.0 to 1.0).
    PlayFx { id: String, volume: f32 },
}

impl AudioCmd {
    pub fn fx(id: impl Into<String>, volume: f32) -> Self {
        AudioCmd::PlayFx {
            id: id.into(),
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            AudioCmd::PlayFx { id, .. } => id,
        }
    }
}
