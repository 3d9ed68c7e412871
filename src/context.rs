//! The handle every behavior callback receives.
//!
//! [`EntityContext`] pairs the simulation [`World`] with the entity whose
//! behavior is running. Callbacks use it to move the entity, query terrain,
//! schedule timers and animations, request state transitions, play sounds
//! and spawn or remove entities. Every operation is scoped to the entity
//! unless its name says otherwise (`*_of`).
//!
//! State transitions requested here are queued on the entity's
//! [`Phase`] and applied right after the running callback returns.
//!
//! # Example
//!
//! ```ignore
//! fn projectile_hit(ctx: &mut EntityContext, other: &Collider) {
//!     if let Some(e) = other.entity() {
//!         if ctx.kind_of(e) == Some(Kind::Projectile) {
//!             ctx.play_sound("bullet", 1.0);
//!         }
//!     }
//!     ctx.remove();
//! }
//! ```

use bevy_ecs::component::Mutable;
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::actors::{self, SpawnParams};
use crate::components::animation::{Animation, AnimationHandler, Frame};
use crate::components::animgroup::{AnimGroup, GroupEntry};
use crate::components::boxcollider::BoxCollider;
use crate::components::forcesource::ForceSource;
use crate::components::inputcontrolled::{Action, Controllable};
use crate::components::kind::Kind;
use crate::components::liveness::Liveness;
use crate::components::mapposition::MapPosition;
use crate::components::phase::{Args, Phase};
use crate::components::rigidbody::RigidBody;
use crate::components::signals::Signals;
use crate::components::sprite::Sprite;
use crate::components::timer::{TimerAction, Timers};
use crate::error::Result;
use crate::events::audio::AudioCmd;
use crate::resources::actorlist::{ActorList, TickLedger};
use crate::resources::eventdispatcher::EventListeners;
use crate::resources::gameconfig::GameConfig;
use crate::resources::input::InputState;
use crate::resources::physics::{self, ForceRegistry, PhysicsParams, SourceSample};
use crate::resources::terrain::{Terrain, TileCoord, TileHit};
use crate::resources::worldtime::WorldTime;
use crate::systems::phase::apply_transitions;

pub struct EntityContext<'w> {
    pub world: &'w mut World,
    pub entity: Entity,
}

impl<'w> EntityContext<'w> {
    pub fn new(world: &'w mut World, entity: Entity) -> Self {
        Self { world, entity }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Simulation clock in seconds.
    pub fn now(&self) -> f32 {
        self.world
            .get_resource::<WorldTime>()
            .map_or(0.0, |t| t.elapsed)
    }

    pub fn exists(&self) -> bool {
        self.world.get_entity(self.entity).is_ok()
    }

    pub fn get<C: Component>(&self) -> Option<&C> {
        self.world.get::<C>(self.entity)
    }

    pub fn get_mut<C: Component<Mutability = Mutable>>(&mut self) -> Option<Mut<'_, C>> {
        self.world.get_mut::<C>(self.entity)
    }

    pub fn get_of<C: Component>(&self, other: Entity) -> Option<&C> {
        self.world.get::<C>(other)
    }

    pub fn kind_of(&self, other: Entity) -> Option<Kind> {
        self.get_of::<Kind>(other).copied()
    }

    // ---- position -------------------------------------------------------

    pub fn position(&self) -> Vec2 {
        self.position_of(self.entity).unwrap_or(Vec2::ZERO)
    }

    pub fn position_of(&self, other: Entity) -> Option<Vec2> {
        self.get_of::<MapPosition>(other).map(|p| p.pos)
    }

    pub fn set_position(&mut self, pos: Vec2) {
        if let Some(mut p) = self.get_mut::<MapPosition>() {
            p.pos = pos;
        }
    }

    /// Move without physics. Hovering entities re-anchor at the new height.
    pub fn warp(&mut self, pos: Vec2) {
        self.set_position(pos);
        if let Some(mut signals) = self.get_mut::<Signals>() {
            if signals.scalar("anchor").is_some() {
                signals.set_scalar("anchor", pos.y);
            }
        }
    }

    /// Sprite size, zero when the entity has no sprite.
    pub fn size(&self) -> Vec2 {
        self.get::<Sprite>()
            .map_or(Vec2::ZERO, |s| Vec2::new(s.width, s.height))
    }

    // ---- physics --------------------------------------------------------

    pub fn body(&self) -> Option<&RigidBody> {
        self.get::<RigidBody>()
    }

    pub fn body_mut(&mut self) -> Option<Mut<'_, RigidBody>> {
        self.get_mut::<RigidBody>()
    }

    /// Field acting on this entity. Sources close enough to feel a strong
    /// pull are notified, at most once per tick for each pair.
    pub fn field(&mut self) -> Vec2 {
        let params = self.physics_params();
        let at = self.position();
        let sources: Vec<SourceSample> = match self.world.get_resource::<ForceRegistry>() {
            Some(registry) => registry
                .sources()
                .iter()
                .filter_map(|&e| {
                    let pos = self.world.get::<MapPosition>(e)?.pos;
                    let magnitude = self.world.get::<ForceSource>(e)?.magnitude;
                    Some(SourceSample {
                        entity: e,
                        pos,
                        magnitude,
                    })
                })
                .collect(),
            None => Vec::new(),
        };
        let field = physics::compute_field(&params, Some(self.entity), at, sources);

        for hit in &field.near {
            let fresh = self
                .world
                .get_resource_mut::<TickLedger>()
                .is_some_and(|mut l| l.mark_proximity(hit.source, self.entity));
            if !fresh {
                continue;
            }
            let Some(callback) = self
                .world
                .get::<ForceSource>(hit.source)
                .and_then(|s| s.on_proximity)
            else {
                continue;
            };
            let mut source_ctx = EntityContext::new(self.world, hit.source);
            callback(&mut source_ctx, self.entity, hit.accel);
            apply_transitions(self.world, hit.source);
        }
        field.accel
    }

    /// Next position from one integration step. The step's time is
    /// consumed but the position is not applied.
    pub fn integrate(&mut self) -> Vec2 {
        let pos = self.position();
        let Some(body) = self.body().cloned() else {
            return pos;
        };
        if !body.physical {
            return pos;
        }
        let accel = if body.gravity_only {
            Vec2::ZERO
        } else {
            self.field()
        };
        let params = self.physics_params();
        let Some(mut body) = self.body_mut() else {
            return pos;
        };
        physics::integrate(&params, &mut body, pos, accel)
    }

    /// Integrate and move.
    pub fn step_physics(&mut self) -> Vec2 {
        let next = self.integrate();
        self.set_position(next);
        next
    }

    /// Restart the body's time origin.
    pub fn reset_physics(&mut self) {
        if let Some(mut body) = self.body_mut() {
            body.reset_time();
        }
    }

    /// Restart the time origin and drop the launch velocity.
    pub fn reset_motion(&mut self) {
        if let Some(mut body) = self.body_mut() {
            body.reset_motion();
        }
    }

    fn physics_params(&self) -> PhysicsParams {
        self.world
            .get_resource::<PhysicsParams>()
            .copied()
            .unwrap_or_default()
    }

    // ---- state machine --------------------------------------------------

    /// Request a switch to `name`; applied after the running callback.
    pub fn set_state(&mut self, name: &str, args: Args) {
        request_state(self.world, self.entity, Some(name.to_string()), args);
    }

    /// Request a return to base behavior.
    pub fn clear_state(&mut self) {
        request_state(self.world, self.entity, None, Args::new());
    }

    pub fn set_state_of(&mut self, other: Entity, name: Option<&str>, args: Args) {
        request_state(self.world, other, name.map(str::to_string), args);
    }

    pub fn current_state(&self) -> Option<String> {
        self.get::<Phase>()
            .and_then(|p| p.current().map(str::to_string))
    }

    pub fn time_in_state(&self) -> f32 {
        self.get::<Phase>().map_or(0.0, |p| p.time_in_state)
    }

    // ---- terrain --------------------------------------------------------

    /// Narrow-phase terrain test at this entity's position plus `offset`.
    pub fn probe_terrain(&self, offset: Vec2) -> Option<TileHit> {
        let point = self.position() + offset;
        self.world
            .get_resource::<Terrain>()
            .and_then(|t| t.check_collision(point))
    }

    pub fn blocked(&self, dx: f32, dy: f32) -> bool {
        self.probe_terrain(Vec2::new(dx, dy)).is_some()
    }

    /// Splash damage at a world point. Returns the number of cells touched.
    pub fn damage_terrain(&mut self, point: Vec2) -> usize {
        self.world
            .get_resource_mut::<Terrain>()
            .map_or(0, |mut t| t.damage(point).len())
    }

    /// Start a blast at `point` on cell `coord`. The point may lie outside
    /// the cell; the damage lands there all the same.
    pub fn blast_terrain(&mut self, coord: TileCoord, point: Vec2) -> bool {
        let now = self.now();
        let Some(mut terrain) = self.world.get_resource_mut::<Terrain>() else {
            return false;
        };
        match terrain.tile_mut(coord) {
            Some(tile) => {
                tile.start_blast(point, now);
                true
            }
            None => false,
        }
    }

    // ---- timers ---------------------------------------------------------

    pub fn register_timer(&mut self, name: &str, timeout: f32, action: TimerAction, repeat: bool) {
        let now = self.now();
        self.ensure::<Timers>();
        if let Some(mut timers) = self.get_mut::<Timers>() {
            timers.register(name, now, timeout, action, repeat);
        }
    }

    pub fn touch_timer(&mut self, name: &str) -> bool {
        let now = self.now();
        self.get_mut::<Timers>().is_some_and(|mut t| t.touch(name, now))
    }

    pub fn unregister_timer(&mut self, name: &str) -> bool {
        self.get_mut::<Timers>()
            .is_some_and(|mut t| t.unregister(name).is_some())
    }

    pub fn timer_exists(&self, name: &str) -> bool {
        self.get::<Timers>().is_some_and(|t| t.exists(name))
    }

    // ---- animation ------------------------------------------------------

    pub fn play_animation(&mut self, name: &str) -> bool {
        let now = self.now();
        self.get_mut::<Animation>()
            .is_some_and(|mut a| a.play(name, now).is_some())
    }

    pub fn play_animation_queue(&mut self, names: &[&str]) -> bool {
        let now = self.now();
        self.get_mut::<Animation>()
            .is_some_and(|mut a| a.play_queue(names, now).is_some())
    }

    pub fn current_animation(&self) -> Option<String> {
        self.get::<Animation>()
            .and_then(|a| a.current().map(str::to_string))
    }

    /// Add (or replace) a named side animation.
    pub fn register_animation(&mut self, entry: GroupEntry<Frame, AnimationHandler>) {
        self.ensure::<AnimGroup>();
        if let Some(mut group) = self.get_mut::<AnimGroup>() {
            group.group.register(entry);
        }
    }

    pub fn unregister_animation(&mut self, name: &str) -> bool {
        self.get_mut::<AnimGroup>()
            .is_some_and(|mut g| g.group.unregister(name))
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.get::<AnimGroup>().is_some_and(|g| g.group.contains(name))
    }

    // ---- audio ----------------------------------------------------------

    pub fn play_sound(&mut self, id: &str, volume: f32) {
        if let Some(mut msgs) = self.world.get_resource_mut::<Messages<AudioCmd>>() {
            msgs.write(AudioCmd::fx(id, volume));
        }
    }

    // ---- lifecycle ------------------------------------------------------

    pub fn liveness(&self) -> Liveness {
        self.get::<Liveness>().copied().unwrap_or_default()
    }

    pub fn set_idle(&mut self, idle: bool) {
        if let Some(mut l) = self.get_mut::<Liveness>() {
            l.idle = idle;
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.liveness().frozen
    }

    /// Mark expired and queue for removal at the end of the tick.
    pub fn remove(&mut self) {
        remove_entity(self.world, self.entity);
    }

    pub fn remove_other(&mut self, other: Entity) {
        remove_entity(self.world, other);
    }

    /// Spawn a built-in kind. It joins the update order next tick.
    pub fn spawn(&mut self, kind: Kind, pos: Vec2, params: &SpawnParams) -> Result<Entity> {
        actors::spawn(self.world, kind, pos, params)
    }

    /// Expire the entity once it is a screen past the left/top edge or
    /// three screens past the right/bottom edge.
    pub fn check_bounds(&mut self) -> bool {
        let (w, h) = self
            .world
            .get_resource::<GameConfig>()
            .map_or((1024.0, 768.0), |c| {
                (c.screen_width as f32, c.screen_height as f32)
            });
        let p = self.position();
        if p.y > h * 3.0 || p.y < -h || p.x > w * 3.0 || p.x < -w {
            log::debug!(
                "{:?} {:?} left the world at ({:.0}, {:.0})",
                self.get::<Kind>(),
                self.entity,
                p.x,
                p.y
            );
            self.remove();
            return false;
        }
        true
    }

    // ---- collisions -----------------------------------------------------

    /// Box test between this entity and `other`.
    pub fn overlapping(&self, other: Entity) -> bool {
        let (Some(a), Some(b)) = (self.get::<BoxCollider>(), self.get_of::<BoxCollider>(other))
        else {
            return false;
        };
        let (Some(pa), Some(pb)) = (self.position_of(self.entity), self.position_of(other)) else {
            return false;
        };
        a.overlaps(pa, b, pb)
    }

    /// Active entities whose boxes overlap this one, in update order.
    pub fn overlapping_entities(&self) -> Vec<Entity> {
        let Some(list) = self.world.get_resource::<ActorList>() else {
            return Vec::new();
        };
        list.iter()
            .filter(|&e| e != self.entity)
            .filter(|&e| self.get_of::<Liveness>(e).is_some_and(|l| l.is_active()))
            .filter(|&e| self.overlapping(e))
            .collect()
    }

    // ---- events and input -----------------------------------------------

    pub fn listen(&mut self, event: &str) {
        let entity = self.entity;
        if let Some(mut listeners) = self.world.get_resource_mut::<EventListeners>() {
            listeners.register(event, entity);
        }
    }

    pub fn unlisten(&mut self, event: &str) {
        let entity = self.entity;
        if let Some(mut listeners) = self.world.get_resource_mut::<EventListeners>() {
            listeners.unregister(event, &entity);
        }
    }

    /// Whether the key bound to `action` is currently held.
    pub fn action_held(&self, action: Action) -> bool {
        let Some(key) = self.get::<Controllable>().and_then(|c| c.key(action)) else {
            return false;
        };
        self.world
            .get_resource::<InputState>()
            .is_some_and(|i| i.is_held(key))
    }

    pub fn action_for_key(&self, key: u32) -> Option<Action> {
        self.get::<Controllable>().and_then(|c| c.action_for(key))
    }

    // ---- signals --------------------------------------------------------

    pub fn scalar(&self, key: &str) -> Option<f32> {
        self.get::<Signals>().and_then(|s| s.scalar(key))
    }

    pub fn set_scalar(&mut self, key: &str, value: f32) {
        self.ensure::<Signals>();
        if let Some(mut s) = self.get_mut::<Signals>() {
            s.set_scalar(key, value);
        }
    }

    pub fn integer(&self, key: &str) -> Option<i32> {
        self.get::<Signals>().and_then(|s| s.integer(key))
    }

    pub fn set_integer(&mut self, key: &str, value: i32) {
        self.ensure::<Signals>();
        if let Some(mut s) = self.get_mut::<Signals>() {
            s.set_integer(key, value);
        }
    }

    pub fn linked(&self, key: &str) -> Option<Entity> {
        self.get::<Signals>().and_then(|s| s.entity(key))
    }

    /// Insert a default `C` if the entity lacks one.
    fn ensure<C: Component + Default>(&mut self) {
        if self.get::<C>().is_some() {
            return;
        }
        if let Ok(mut e) = self.world.get_entity_mut(self.entity) {
            e.insert(C::default());
        }
    }
}

/// Queue a transition on `entity`. Expired or vanished entities ignore it.
pub fn request_state(world: &mut World, entity: Entity, target: Option<String>, args: Args) {
    let expired = world.get::<Liveness>(entity).is_some_and(|l| l.expired);
    if expired {
        log::debug!("{:?} is expired, transition to {:?} dropped", entity, target);
        return;
    }
    match world.get_mut::<Phase>(entity) {
        Some(mut phase) => phase.request(target, args),
        None => log::debug!("{:?} has no state machine, transition to {:?} dropped", entity, target),
    }
}

/// Mark `entity` expired and queue its removal.
pub fn remove_entity(world: &mut World, entity: Entity) {
    if let Some(mut l) = world.get_mut::<Liveness>(entity) {
        l.expired = true;
    }
    if let Some(mut list) = world.get_resource_mut::<ActorList>() {
        if list.queue_removal(entity) {
            log::debug!("{:?} queued for removal", entity);
        }
    }
}
