//! Input forwarding.
//!
//! The polling layer owns the keyboard; [`forward_input`] receives one key
//! transition, updates [`InputState`] (held keys read by behaviors through
//! [`EntityContext::action_held`](crate::context::EntityContext::action_held))
//! and dispatches `"key_down"` / `"key_up"` to the registered listeners with
//! the key id as the single argument.
use bevy_ecs::prelude::*;
use smallvec::smallvec;

use crate::components::phase::{Arg, Args};
use crate::events::input::{InputEvent, InputKind};
use crate::resources::input::InputState;
use crate::systems::phase::dispatch_event;

/// Returns how many listeners received the event.
pub fn forward_input(world: &mut World, kind: InputKind, key: u32) -> usize {
    if let Some(mut input) = world.get_resource_mut::<InputState>() {
        match kind {
            InputKind::KeyDown => input.press(key),
            InputKind::KeyUp => input.release(key),
        };
    }
    if let Some(mut msgs) = world.get_resource_mut::<Messages<InputEvent>>() {
        msgs.write(InputEvent { kind, key });
    }
    let args: Args = smallvec![Arg::Key(key)];
    let reached = dispatch_event(world, kind.event_name(), &args);
    log::trace!("{} {} reached {} listener(s)", kind.event_name(), key, reached);
    reached
}
