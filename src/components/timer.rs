//! Named, owner-scoped timers.
//!
//! [`TimerScheduler`] is the clock-agnostic core: callers pass the current
//! time in seconds and receive the actions that became due. The [`Timers`]
//! component wraps one scheduler per entity with callback actions that the
//! [`update_timers`](crate::systems::timer::update_timers) system runs.
//!
//! Re-registering an existing name only refreshes its start time, so code
//! that registers on every tick ("keep alive") never duplicates entries.

use std::ops::{Deref, DerefMut};

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

use crate::context::EntityContext;

#[derive(Debug, Clone, PartialEq)]
pub struct TimerEntry<A> {
    pub start: f32,
    pub timeout: f32,
    pub action: A,
    pub repeat: bool,
}

impl<A> TimerEntry<A> {
    pub fn elapsed(&self, now: f32) -> f32 {
        now - self.start
    }

    pub fn is_due(&self, now: f32) -> bool {
        self.elapsed(now) >= self.timeout
    }
}

#[derive(Debug, Clone)]
pub struct TimerScheduler<A> {
    entries: FxHashMap<String, TimerEntry<A>>,
}

impl<A> Default for TimerScheduler<A> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<A: Clone> TimerScheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a timer. Returns `false` when `name` already existed, in
    /// which case only its start time was reset.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        now: f32,
        timeout: f32,
        action: A,
        repeat: bool,
    ) -> bool {
        let name = name.into();
        if let Some(entry) = self.entries.get_mut(&name) {
            entry.start = now;
            return false;
        }
        self.entries.insert(
            name,
            TimerEntry {
                start: now,
                timeout,
                action,
                repeat,
            },
        );
        true
    }

    /// Reset the start time of an existing timer. Returns `false` if absent.
    pub fn touch(&mut self, name: &str, now: f32) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.start = now;
                true
            }
            None => false,
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn unregister(&mut self, name: &str) -> Option<TimerEntry<A>> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&TimerEntry<A>> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Collect every due timer. One-shot entries are removed, repeating
    /// entries restart at `now`. Each entry fires at most once per call and
    /// the returned order is by name.
    pub fn update(&mut self, now: f32) -> Vec<(String, A)> {
        let mut due: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_due(now))
            .map(|(name, _)| name.clone())
            .collect();
        due.sort_unstable();

        let mut fired = Vec::with_capacity(due.len());
        for name in due {
            let keep = match self.entries.get_mut(&name) {
                Some(entry) if entry.repeat => {
                    entry.start = now;
                    fired.push((name.clone(), entry.action.clone()));
                    true
                }
                Some(entry) => {
                    fired.push((name.clone(), entry.action.clone()));
                    false
                }
                None => true,
            };
            if !keep {
                self.entries.remove(&name);
            }
        }
        fired
    }
}

/// Callback run when an entity timer fires.
pub type TimerAction = fn(&mut EntityContext);

/// Per-entity timer set.
#[derive(Component, Default, Clone)]
pub struct Timers {
    scheduler: TimerScheduler<TimerAction>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for Timers {
    type Target = TimerScheduler<TimerAction>;

    fn deref(&self) -> &Self::Target {
        &self.scheduler
    }
}

impl DerefMut for Timers {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once_then_disappears() {
        let mut t = TimerScheduler::new();
        t.register("boom", 0.0, 1.0, 7u32, false);
        assert!(t.update(0.5).is_empty());
        let fired = t.update(1.0);
        assert_eq!(fired, vec![("boom".to_string(), 7)]);
        assert!(!t.exists("boom"));
        assert!(t.update(5.0).is_empty());
    }

    #[test]
    fn repeating_timer_restarts_its_clock() {
        let mut t = TimerScheduler::new();
        t.register("tick", 0.0, 1.0, (), true);
        assert_eq!(t.update(1.0).len(), 1);
        // clock reset at 1.0, so 1.5 is not yet due
        assert!(t.update(1.5).is_empty());
        assert_eq!(t.update(2.0).len(), 1);
        assert!(t.exists("tick"));
        assert_eq!(t.get("tick").map(|e| e.start), Some(2.0));
    }

    #[test]
    fn reregistering_refreshes_instead_of_duplicating() {
        let mut t = TimerScheduler::new();
        assert!(t.register("fuse", 0.0, 2.0, 1u8, false));
        assert!(!t.register("fuse", 1.5, 9.0, 2u8, true));
        assert_eq!(t.len(), 1);
        let entry = t.get("fuse").unwrap();
        assert_eq!(entry.start, 1.5);
        assert_eq!(entry.timeout, 2.0);
        assert_eq!(entry.action, 1);
        assert!(!entry.repeat);
        assert!(t.update(3.0).is_empty());
        assert_eq!(t.update(3.5).len(), 1);
    }

    #[test]
    fn touch_resets_start_only() {
        let mut t = TimerScheduler::new();
        t.register("a", 0.0, 1.0, (), false);
        assert!(t.touch("a", 0.9));
        assert!(t.update(1.0).is_empty());
        assert!(!t.touch("missing", 0.0));
    }

    #[test]
    fn simultaneous_timers_fire_in_stable_order() {
        let mut t = TimerScheduler::new();
        t.register("c", 0.0, 1.0, 3, false);
        t.register("a", 0.0, 1.0, 1, true);
        t.register("b", 0.0, 0.5, 2, false);
        let fired: Vec<i32> = t.update(1.0).into_iter().map(|(_, a)| a).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn unregister_is_lookup() {
        let mut t = TimerScheduler::new();
        t.register("x", 0.0, 1.0, (), false);
        assert!(t.unregister("x").is_some());
        assert!(t.unregister("x").is_none());
        assert!(t.is_empty());
    }
}
