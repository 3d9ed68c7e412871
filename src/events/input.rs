//! Input notifications forwarded from the polling layer.

use bevy_ecs::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    KeyDown,
    KeyUp,
}

impl InputKind {
    /// Dispatcher event name for this kind.
    pub fn event_name(&self) -> &'static str {
        match self {
            InputKind::KeyDown => "key_down",
            InputKind::KeyUp => "key_up",
        }
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub key: u32,
}
