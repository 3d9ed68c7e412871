//! State machine execution.
//!
//! Every behavior invocation goes through one of the runners below. Each
//! runner resolves the callback against the entity's active state (falling
//! back to base behavior), calls it with an [`EntityContext`], and then
//! flushes the transitions the callback requested with
//! [`apply_transitions`].
//!
//! # Related
//!
//! - [`Phase`](crate::components::phase::Phase) – the state machine component
//! - [`crate::context::EntityContext::set_state`] – how callbacks request transitions

use bevy_ecs::prelude::*;

use crate::components::liveness::Liveness;
use crate::components::phase::{Args, Phase};
use crate::context::EntityContext;
use crate::events::collision::{Collider, CollisionEvent};
use crate::resources::eventdispatcher::EventListeners;

/// Apply queued transitions of `entity` in request order: exit hook of the
/// old state, switch, entry hook of the new one. Transitions requested by
/// the hooks are applied by the same loop afterwards. A call made while a
/// transition of `entity` is in progress does nothing.
pub fn apply_transitions(world: &mut World, entity: Entity) {
    loop {
        let expired = world.get::<Liveness>(entity).is_some_and(|l| l.expired);
        let Some(mut phase) = world.get_mut::<Phase>(entity) else {
            return;
        };
        if expired && !phase.is_transitioning() {
            if phase.has_pending() {
                log::debug!("{:?} expired, pending transitions dropped", entity);
                phase.clear_pending();
            }
            return;
        }
        let Some((transition, on_exit, on_enter)) = phase.begin_transition() else {
            return;
        };
        let from = phase.current().map(str::to_string);

        if let Some(exit) = on_exit {
            exit(&mut EntityContext::new(world, entity));
        }
        if let Some(mut phase) = world.get_mut::<Phase>(entity) {
            phase.switch_to(transition.target.clone());
        }
        log::debug!(
            "{:?} state {:?} -> {:?}",
            entity,
            from.as_deref().unwrap_or("<base>"),
            transition.target.as_deref().unwrap_or("<base>")
        );
        if let Some(enter) = on_enter {
            enter(&mut EntityContext::new(world, entity), &transition.args);
        }
        if let Some(mut phase) = world.get_mut::<Phase>(entity) {
            phase.end_transition();
        }
    }
}

/// Run the entity's `update` behavior once.
pub fn run_update(world: &mut World, entity: Entity) {
    let callback = world.get::<Phase>(entity).and_then(|p| p.resolve_update());
    if let Some(update) = callback {
        update(&mut EntityContext::new(world, entity));
    }
    apply_transitions(world, entity);
}

/// Deliver a collision to `entity`.
pub fn run_collision(world: &mut World, entity: Entity, other: Collider) {
    let callback = world
        .get::<Phase>(entity)
        .and_then(|p| p.resolve_collision());
    if let Some(on_collision) = callback {
        on_collision(&mut EntityContext::new(world, entity), &other);
    }
    if let Some(mut msgs) = world.get_resource_mut::<Messages<CollisionEvent>>() {
        msgs.write(CollisionEvent { entity, other });
    }
    apply_transitions(world, entity);
}

/// Deliver a named event to `entity`.
pub fn run_event(world: &mut World, entity: Entity, event: &str, args: &Args) {
    let callback = world.get::<Phase>(entity).and_then(|p| p.resolve_event());
    if let Some(on_event) = callback {
        on_event(&mut EntityContext::new(world, entity), event, args);
    }
    apply_transitions(world, entity);
}

/// Fan `event` out to its listeners in registration order. Expired
/// listeners are skipped. Returns how many listeners ran.
pub fn dispatch_event(world: &mut World, event: &str, args: &Args) -> usize {
    let listeners = world
        .get_resource::<EventListeners>()
        .map(|l| l.listeners(event))
        .unwrap_or_default();
    let mut ran = 0;
    for entity in listeners {
        let live = world
            .get::<Liveness>(entity)
            .is_none_or(|l| !l.expired);
        if !live || world.get_entity(entity).is_err() {
            continue;
        }
        run_event(world, entity, event, args);
        ran += 1;
    }
    ran
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::components::phase::{Arg, Behavior, StateDef, StateTable};
    use crate::components::signals::Signals;

    fn log(ctx: &mut EntityContext, line: &str) {
        let n = ctx.integer("n").unwrap_or(0);
        ctx.set_integer("n", n + 1);
        let mut s = ctx.get_mut::<Signals>().unwrap();
        s.set_flag(format!("{}:{}", n, line));
    }

    fn a_enter(ctx: &mut EntityContext, _: &Args) {
        log(ctx, "enter a");
        // nested request from an entry hook
        ctx.set_state("b", Args::new());
    }
    fn a_exit(ctx: &mut EntityContext) {
        log(ctx, "exit a");
    }
    fn b_enter(ctx: &mut EntityContext, args: &Args) {
        log(ctx, &format!("enter b {}", args.len()));
    }
    fn b_exit(ctx: &mut EntityContext) {
        log(ctx, "exit b");
    }
    fn base_update(ctx: &mut EntityContext) {
        log(ctx, "base");
        ctx.set_state("a", Args::new());
        // not yet applied while the handler runs
        assert_eq!(ctx.current_state(), None);
    }
    fn b_update(ctx: &mut EntityContext) {
        log(ctx, "b update");
    }
    fn listener(ctx: &mut EntityContext, event: &str, args: &Args) {
        if let Some(Arg::Key(k)) = args.first() {
            log(ctx, &format!("{} {}", event, k));
        }
    }

    fn machine() -> Phase {
        let table = StateTable::new()
            .state("a", StateDef::new().on_enter(a_enter).on_exit(a_exit))
            .state(
                "b",
                StateDef::new()
                    .on_enter(b_enter)
                    .on_exit(b_exit)
                    .update(b_update),
            );
        Phase::new(
            Behavior::new().update(base_update).on_event(listener),
            Arc::new(table),
        )
    }

    fn flags(world: &World, e: Entity) -> Vec<String> {
        let mut v: Vec<String> = world.get::<Signals>(e).unwrap().flags.iter().cloned().collect();
        v.sort();
        v
    }

    #[test]
    fn nested_requests_apply_in_order_after_hooks() {
        let mut world = World::new();
        let e = world.spawn((machine(), Liveness::new(), Signals::default())).id();

        run_update(&mut world, e);
        assert_eq!(world.get::<Phase>(e).unwrap().current(), Some("b"));
        assert_eq!(
            flags(&world, e),
            vec!["0:base", "1:enter a", "2:exit a", "3:enter b 0"]
        );

        // next update resolves against "b"
        run_update(&mut world, e);
        assert!(flags(&world, e).contains(&"4:b update".to_string()));
    }

    #[test]
    fn expired_entity_ignores_transitions() {
        let mut world = World::new();
        let e = world
            .spawn((
                machine(),
                Liveness {
                    expired: true,
                    ..Liveness::new()
                },
                Signals::default(),
            ))
            .id();
        crate::context::request_state(&mut world, e, Some("a".into()), Args::new());
        apply_transitions(&mut world, e);
        assert_eq!(world.get::<Phase>(e).unwrap().current(), None);
        assert!(!world.get::<Phase>(e).unwrap().has_pending());
    }

    #[test]
    fn dispatch_reaches_listeners_and_is_silent_without_them() {
        let mut world = World::new();
        world.init_resource::<EventListeners>();
        let e = world.spawn((machine(), Liveness::new(), Signals::default())).id();
        let args: Args = smallvec::smallvec![Arg::Key(7)];
        assert_eq!(dispatch_event(&mut world, "key_down", &args), 0);

        world.resource_mut::<EventListeners>().register("key_down", e);
        assert_eq!(dispatch_event(&mut world, "key_down", &args), 1);
        assert_eq!(flags(&world, e), vec!["0:key_down 7"]);
    }
}
