//! Per-entity state machine.
//!
//! A [`Phase`] holds a *base* [`Behavior`] (what the entity does with no
//! state active) and a shared [`StateTable`] of named [`StateDef`] override
//! bundles. At most one state is active. Every per-tick call is resolved
//! against the active state first and falls back to the base behavior when
//! the state does not override that slot.
//!
//! # Transitions
//!
//! Handlers never switch state synchronously. They *request* a transition
//! (see [`EntityContext::set_state`](crate::context::EntityContext::set_state))
//! which is queued here and applied by
//! [`apply_transitions`](crate::systems::phase::apply_transitions) as soon as
//! the running handler returns:
//!
//! 1. the old state's `on_exit` runs,
//! 2. the active state switches and `time_in_state` resets,
//! 3. the new state's `on_enter` runs with the request's arguments.
//!
//! Requests issued from inside those hooks are appended to the same queue
//! and applied afterwards in request order.
//!
//! # Example
//!
//! ```ignore
//! let table = StateTable::new().state(
//!     "digging",
//!     StateDef::new().on_enter(dig_enter).update(dig_update).on_exit(dig_exit),
//! );
//! commands.spawn(Phase::new(Behavior::new().update(physical_update), Arc::new(table)));
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use glam::Vec2;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::context::EntityContext;
use crate::events::collision::Collider;
use crate::resources::terrain::TileCoord;

/// A single argument passed to entry hooks and event listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Entity(Entity),
    Tile(TileCoord),
    Point(Vec2),
    Scalar(f32),
    Key(u32),
}

pub type Args = SmallVec<[Arg; 2]>;

pub type UpdateCallback = fn(&mut EntityContext);
pub type CollisionCallback = fn(&mut EntityContext, other: &Collider);
pub type EnterCallback = fn(&mut EntityContext, args: &Args);
pub type ExitCallback = fn(&mut EntityContext);
pub type EventCallback = fn(&mut EntityContext, event: &str, args: &Args);

/// Default behavior slots of an entity kind.
#[derive(Clone, Copy, Default)]
pub struct Behavior {
    pub update: Option<UpdateCallback>,
    pub on_collision: Option<CollisionCallback>,
    pub on_event: Option<EventCallback>,
}

impl Behavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(mut self, callback: UpdateCallback) -> Self {
        self.update = Some(callback);
        self
    }

    pub fn on_collision(mut self, callback: CollisionCallback) -> Self {
        self.on_collision = Some(callback);
        self
    }

    pub fn on_event(mut self, callback: EventCallback) -> Self {
        self.on_event = Some(callback);
        self
    }
}

/// Override bundle for one named state. Empty slots fall through to the
/// base behavior.
#[derive(Clone, Copy, Default)]
pub struct StateDef {
    pub update: Option<UpdateCallback>,
    pub on_collision: Option<CollisionCallback>,
    pub on_event: Option<EventCallback>,
    pub on_enter: Option<EnterCallback>,
    pub on_exit: Option<ExitCallback>,
}

impl StateDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(mut self, callback: UpdateCallback) -> Self {
        self.update = Some(callback);
        self
    }

    pub fn on_collision(mut self, callback: CollisionCallback) -> Self {
        self.on_collision = Some(callback);
        self
    }

    pub fn on_event(mut self, callback: EventCallback) -> Self {
        self.on_event = Some(callback);
        self
    }

    pub fn on_enter(mut self, callback: EnterCallback) -> Self {
        self.on_enter = Some(callback);
        self
    }

    pub fn on_exit(mut self, callback: ExitCallback) -> Self {
        self.on_exit = Some(callback);
        self
    }
}

/// Named states of an entity kind, shared by every instance of the kind.
#[derive(Clone, Default)]
pub struct StateTable {
    states: FxHashMap<String, StateDef>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, name: impl Into<String>, def: StateDef) -> Self {
        self.states.insert(name.into(), def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&StateDef> {
        self.states.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }
}

/// A queued state change. `target == None` restores base behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub target: Option<String>,
    pub args: Args,
}

#[derive(Component, Clone)]
pub struct Phase {
    pub base: Behavior,
    table: Arc<StateTable>,
    current: Option<String>,
    previous: Option<String>,
    pending: VecDeque<Transition>,
    transitioning: bool,
    /// Seconds since the active state (or base behavior) was entered.
    pub time_in_state: f32,
}

impl Phase {
    pub fn new(base: Behavior, table: Arc<StateTable>) -> Self {
        Self {
            base,
            table,
            current: None,
            previous: None,
            pending: VecDeque::new(),
            transitioning: false,
            time_in_state: 0.0,
        }
    }

    /// Base behavior only, no named states.
    pub fn stateless(base: Behavior) -> Self {
        Self::new(base, Arc::new(StateTable::new()))
    }

    /// Name of the active state, `None` for base behavior.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Queue a transition; it is applied after the running handler returns.
    pub fn request(&mut self, target: Option<String>, args: Args) {
        self.pending.push_back(Transition { target, args });
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    fn active_def(&self) -> Option<&StateDef> {
        self.current.as_deref().and_then(|name| self.table.get(name))
    }

    pub fn resolve_update(&self) -> Option<UpdateCallback> {
        self.active_def()
            .and_then(|d| d.update)
            .or(self.base.update)
    }

    pub fn resolve_collision(&self) -> Option<CollisionCallback> {
        self.active_def()
            .and_then(|d| d.on_collision)
            .or(self.base.on_collision)
    }

    pub fn resolve_event(&self) -> Option<EventCallback> {
        self.active_def()
            .and_then(|d| d.on_event)
            .or(self.base.on_event)
    }

    /// Start applying the next queued transition. Returns the transition
    /// plus the exit hook of the state being left and the entry hook of the
    /// state being entered. `None` when nothing is queued or a transition is
    /// already in progress.
    pub fn begin_transition(
        &mut self,
    ) -> Option<(Transition, Option<ExitCallback>, Option<EnterCallback>)> {
        if self.transitioning {
            return None;
        }
        let transition = self.pending.pop_front()?;
        self.transitioning = true;
        let on_exit = self.active_def().and_then(|d| d.on_exit);
        let on_enter = match transition.target.as_deref() {
            Some(name) => match self.table.get(name) {
                Some(def) => def.on_enter,
                None => {
                    log::debug!("state '{}' is not defined, entering with base behavior", name);
                    None
                }
            },
            None => None,
        };
        Some((transition, on_exit, on_enter))
    }

    /// Switch the active state. Called between the exit and entry hooks.
    pub fn switch_to(&mut self, target: Option<String>) {
        self.previous = std::mem::replace(&mut self.current, target);
        self.time_in_state = 0.0;
    }

    pub fn end_transition(&mut self) {
        self.transitioning = false;
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("pending", &self.pending)
            .field("transitioning", &self.transitioning)
            .field("time_in_state", &self.time_in_state)
            .field("states", &self.table.states.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_update(_: &mut EntityContext) {}
    fn other_update(_: &mut EntityContext) {}
    fn noop_collision(_: &mut EntityContext, _: &Collider) {}
    fn noop_exit(_: &mut EntityContext) {}
    fn noop_enter(_: &mut EntityContext, _: &Args) {}

    fn table() -> Arc<StateTable> {
        Arc::new(
            StateTable::new()
                .state("busy", StateDef::new().update(other_update).on_exit(noop_exit))
                .state("quiet", StateDef::new().on_enter(noop_enter)),
        )
    }

    #[test]
    fn resolves_against_active_state_then_base() {
        let base = Behavior::new().update(noop_update).on_collision(noop_collision);
        let mut phase = Phase::new(base, table());
        assert_eq!(phase.resolve_update(), Some(noop_update as UpdateCallback));

        phase.switch_to(Some("busy".into()));
        assert_eq!(phase.resolve_update(), Some(other_update as UpdateCallback));
        // not overridden in "busy"
        assert_eq!(
            phase.resolve_collision(),
            Some(noop_collision as CollisionCallback)
        );

        phase.switch_to(None);
        assert_eq!(phase.current(), None);
        assert_eq!(phase.previous(), Some("busy"));
    }

    #[test]
    fn begin_transition_picks_exit_of_old_and_enter_of_new() {
        let mut phase = Phase::new(Behavior::new(), table());
        phase.switch_to(Some("busy".into()));
        phase.request(Some("quiet".into()), Args::new());

        let (t, exit, enter) = phase.begin_transition().unwrap();
        assert_eq!(t.target.as_deref(), Some("quiet"));
        assert!(exit.is_some());
        assert!(enter.is_some());
        // guarded while in progress
        phase.request(None, Args::new());
        assert!(phase.begin_transition().is_none());
        phase.switch_to(t.target);
        phase.end_transition();

        let (t, exit, enter) = phase.begin_transition().unwrap();
        assert_eq!(t.target, None);
        assert!(exit.is_none());
        assert!(enter.is_none());
    }

    #[test]
    fn undefined_state_has_no_hooks() {
        let mut phase = Phase::new(Behavior::new().update(noop_update), table());
        phase.request(Some("ghost".into()), Args::new());
        let (t, exit, enter) = phase.begin_transition().unwrap();
        assert!(exit.is_none() && enter.is_none());
        phase.switch_to(t.target);
        phase.end_transition();
        assert_eq!(phase.current(), Some("ghost"));
        assert_eq!(phase.resolve_update(), Some(noop_update as UpdateCallback));
    }
}
