//! Named-event fan-out.
//!
//! [`EventDispatcher`] maps event names to listeners in registration order.
//! Dispatching a name nobody listens to does nothing. The world-level
//! [`EventListeners`] resource stores entities as listeners; their
//! `on_event` behavior is invoked by
//! [`dispatch_event`](crate::systems::phase::dispatch_event).

use std::ops::{Deref, DerefMut};

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct EventDispatcher<L> {
    listeners: FxHashMap<String, Vec<L>>,
}

impl<L> Default for EventDispatcher<L> {
    fn default() -> Self {
        Self {
            listeners: FxHashMap::default(),
        }
    }
}

impl<L: PartialEq + Clone> EventDispatcher<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `listener` for `event`. Registering the same listener twice for
    /// one event is ignored.
    pub fn register(&mut self, event: impl Into<String>, listener: L) -> bool {
        let list = self.listeners.entry(event.into()).or_default();
        if list.contains(&listener) {
            return false;
        }
        list.push(listener);
        true
    }

    pub fn unregister(&mut self, event: &str, listener: &L) -> bool {
        let Some(list) = self.listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l != listener);
        let removed = before != list.len();
        if list.is_empty() {
            self.listeners.remove(event);
        }
        removed
    }

    /// Drop `listener` from every event.
    pub fn unregister_all(&mut self, listener: &L) {
        self.listeners.retain(|_, list| {
            list.retain(|l| l != listener);
            !list.is_empty()
        });
    }

    /// Snapshot of the listeners of `event`, in registration order.
    pub fn listeners(&self, event: &str) -> Vec<L> {
        self.listeners.get(event).cloned().unwrap_or_default()
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners.get(event).is_some_and(|l| !l.is_empty())
    }

    /// Call `f` for every listener of `event`. Returns how many were called.
    pub fn dispatch(&self, event: &str, mut f: impl FnMut(&L)) -> usize {
        match self.listeners.get(event) {
            Some(list) => {
                list.iter().for_each(&mut f);
                list.len()
            }
            None => 0,
        }
    }
}

/// Entity listeners of the simulation.
#[derive(Resource, Debug, Default, Clone)]
pub struct EventListeners {
    inner: EventDispatcher<Entity>,
}

impl Deref for EventListeners {
    type Target = EventDispatcher<Entity>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for EventListeners {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_in_registration_order() {
        let mut d = EventDispatcher::new();
        d.register("boom", 2);
        d.register("boom", 1);
        d.register("boom", 2);
        let mut seen = Vec::new();
        assert_eq!(d.dispatch("boom", |l| seen.push(*l)), 2);
        assert_eq!(seen, vec![2, 1]);
    }

    #[test]
    fn unknown_event_is_silent() {
        let d: EventDispatcher<u8> = EventDispatcher::new();
        assert_eq!(d.dispatch("nobody", |_| panic!("no listener expected")), 0);
        assert!(d.listeners("nobody").is_empty());
    }

    #[test]
    fn unregister_single_and_all() {
        let mut d = EventDispatcher::new();
        d.register("a", 'x');
        d.register("b", 'x');
        d.register("b", 'y');
        assert!(d.unregister("a", &'x'));
        assert!(!d.unregister("a", &'x'));
        assert!(!d.has_listeners("a"));
        d.unregister_all(&'x');
        assert_eq!(d.listeners("b"), vec!['y']);
    }
}
