//! Mouse selection.
//!
//! [`Selection`] belongs to the input layer and remembers which entity the
//! user picked last. Picking an entity holds it: it is frozen (and parked in
//! its `inactive` state when it has one) and follows drags until released.
//! On release a [`Controllable`] entity takes the keyboard in its
//! `controllable` state and gets a marker arrow above it; anything else
//! returns to base behavior. Picking something else, or nothing, returns the
//! previous pick to base behavior.
//!
//! Vehicles:
//! - picking the selected walker again while it overlaps a free
//!   [`Seatable`] seats it there and hands the selection to the vehicle;
//! - picking the selected vehicle again and releasing it without dragging
//!   it away lets its driver out.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::actors::tank::BURNED_STATE;
use crate::actors::INACTIVE_STATE;
use crate::components::animation::{AnimationHandler, AnimationSpec, Animator, Frame};
use crate::components::animgroup::{Anchor, AnimGroup, GroupEntry};
use crate::components::inputcontrolled::{Controllable, CONTROLLABLE_STATE};
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::phase::{Args, Phase};
use crate::components::seatable::{Seatable, Seated};
use crate::components::sprite::Sprite;
use crate::context::{request_state, EntityContext};
use crate::resources::worldtime::WorldTime;
use crate::systems::phase::apply_transitions;

pub const ARROW: &str = "arrow";
const ARROW_OFFSET: Vec2 = Vec2::new(0.0, -80.0);
/// A vehicle released closer than this to where it was picked lets its
/// driver out.
pub const EJECT_DISTANCE: f32 = 50.0;

#[derive(Debug, Default, Clone)]
pub struct Selection {
    last: Option<Entity>,
    held: Option<Entity>,
    picked_at: Vec2,
    eject_armed: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entity picked last, if it still exists.
    pub fn current(&self) -> Option<Entity> {
        self.last
    }

    pub fn held(&self) -> Option<Entity> {
        self.held
    }

    /// Mouse press on `target` (or on empty space).
    pub fn click(&mut self, world: &mut World, target: Option<Entity>) {
        self.drop_vanished(world);
        let Some(entity) = target.filter(|&e| world.get_entity(e).is_ok()) else {
            self.clear(world);
            return;
        };

        if self.last == Some(entity) {
            if world.get::<Kind>(entity) == Some(&Kind::Walker) {
                if let Some(vehicle) = free_seat_under(world, entity) {
                    self.board(world, entity, vehicle);
                    return;
                }
            }
            self.eject_armed = world.get::<Seatable>(entity).is_some_and(|s| s.has_driver());
        } else {
            self.release_previous(world);
            self.eject_armed = false;
        }

        let has_inactive = world
            .get::<Phase>(entity)
            .is_some_and(|p| p.table().contains(INACTIVE_STATE));
        if has_inactive {
            transition(world, entity, Some(INACTIVE_STATE));
        }
        if let Some(mut l) = world.get_mut::<Liveness>(entity) {
            l.frozen = true;
        }
        self.picked_at = world
            .get::<MapPosition>(entity)
            .map_or(Vec2::ZERO, |p| p.pos);
        self.last = Some(entity);
        self.held = Some(entity);
        log::debug!("picked {:?}", entity);
    }

    /// Mouse moved to `pos` with the button down.
    pub fn drag(&mut self, world: &mut World, pos: Vec2) {
        let Some(entity) = self.held else {
            return;
        };
        if world.get_entity(entity).is_err() {
            self.held = None;
            return;
        }
        EntityContext::new(world, entity).warp(pos);
    }

    /// Mouse button released.
    pub fn release(&mut self, world: &mut World) {
        let Some(entity) = self.held.take() else {
            return;
        };
        if world.get_entity(entity).is_err() {
            self.last = None;
            return;
        }
        if let Some(mut l) = world.get_mut::<Liveness>(entity) {
            l.frozen = false;
        }

        if self.eject_armed {
            self.eject_armed = false;
            let pos = EntityContext::new(world, entity).position();
            if pos.distance(self.picked_at) < EJECT_DISTANCE {
                eject(world, entity);
            }
        }

        if world.get::<Controllable>(entity).is_some() {
            take_controls(world, entity);
        } else {
            transition(world, entity, None);
        }
    }

    /// Forget the selection, returning the last pick to base behavior.
    pub fn clear(&mut self, world: &mut World) {
        self.release_previous(world);
        self.last = None;
        self.held = None;
        self.eject_armed = false;
    }

    fn release_previous(&mut self, world: &mut World) {
        let Some(prev) = self.last.take() else {
            return;
        };
        if world.get_entity(prev).is_err() {
            return;
        }
        if let Some(mut l) = world.get_mut::<Liveness>(prev) {
            l.frozen = false;
        }
        EntityContext::new(world, prev).unregister_animation(ARROW);
        transition(world, prev, None);
    }

    fn drop_vanished(&mut self, world: &World) {
        if self.last.is_some_and(|e| world.get_entity(e).is_err()) {
            self.last = None;
            self.held = None;
        }
    }

    fn board(&mut self, world: &mut World, driver: Entity, vehicle: Entity) {
        let boarded = world
            .get_mut::<Seatable>(vehicle)
            .is_some_and(|mut s| s.board(driver));
        if !boarded {
            return;
        }
        {
            let mut ctx = EntityContext::new(world, driver);
            ctx.unregister_animation(ARROW);
            ctx.set_idle(true);
            if let Some(mut body) = ctx.body_mut() {
                body.physical = false;
            }
            let at = ctx.position_of(vehicle).unwrap_or_else(|| ctx.position());
            ctx.warp(at);
        }
        if let Ok(mut e) = world.get_entity_mut(driver) {
            e.insert(Seated { vehicle });
        }
        if let Some(mut l) = world.get_mut::<Liveness>(driver) {
            l.frozen = false;
        }
        transition(world, driver, None);
        log::debug!("{:?} boarded {:?}", driver, vehicle);

        self.last = Some(vehicle);
        self.held = None;
        self.eject_armed = false;
        take_controls(world, vehicle);
    }
}

/// First vehicle with a free seat overlapping `walker`.
fn free_seat_under(world: &mut World, walker: Entity) -> Option<Entity> {
    let candidates = EntityContext::new(world, walker).overlapping_entities();
    candidates
        .into_iter()
        .find(|&e| world.get::<Seatable>(e).is_some_and(|s| !s.has_driver()))
}

/// Let the driver of `vehicle` out beside it.
fn eject(world: &mut World, vehicle: Entity) {
    let Some(driver) = world.get_mut::<Seatable>(vehicle).and_then(|mut s| s.leave()) else {
        return;
    };
    if let Ok(mut e) = world.get_entity_mut(driver) {
        e.remove::<Seated>();
    }
    let half = |e: Entity| world.get::<Sprite>(e).map_or(0.0, |s| s.half_width());
    let gap = half(vehicle) + half(driver);
    let mut ctx = EntityContext::new(world, driver);
    ctx.set_idle(false);
    if let Some(mut body) = ctx.body_mut() {
        body.physical = true;
    }
    ctx.reset_motion();
    let at = ctx.position_of(vehicle).unwrap_or_else(|| ctx.position());
    ctx.warp(at - Vec2::new(gap, 0.0));
    log::debug!("{:?} left {:?}", driver, vehicle);
}

fn take_controls(world: &mut World, entity: Entity) {
    if burned_out(world, entity) {
        return;
    }
    transition(world, entity, Some(CONTROLLABLE_STATE));
    let now = world.get_resource::<WorldTime>().map_or(0.0, |t| t.elapsed);
    let mut arrow: Animator<Frame, AnimationHandler> =
        Animator::new().with(ARROW, [Frame::new(ARROW, 0)], AnimationSpec::timed(1.0));
    arrow.play(ARROW, now);
    EntityContext::new(world, entity).register_animation(GroupEntry::new(
        ARROW,
        Anchor::Owner(ARROW_OFFSET),
        0.95,
        arrow,
    ));
}

/// A burned tank keeps its state whatever the selection does.
fn burned_out(world: &World, entity: Entity) -> bool {
    world
        .get::<Phase>(entity)
        .is_some_and(|p| p.current() == Some(BURNED_STATE))
}

fn transition(world: &mut World, entity: Entity, state: Option<&str>) {
    if burned_out(world, entity) {
        return;
    }
    request_state(world, entity, state.map(str::to_string), Args::new());
    apply_transitions(world, entity);
}

/// Whether `entity` shows the selection arrow.
pub fn has_arrow(world: &World, entity: Entity) -> bool {
    world
        .get::<AnimGroup>(entity)
        .is_some_and(|g| g.group.contains(ARROW))
}
