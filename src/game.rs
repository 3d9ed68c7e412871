//! Simulation facade.
//!
//! [`Simulation`] owns the ECS [`World`] with every resource the core needs
//! and exposes the handful of calls the surrounding layers make: populate
//! the level, advance one tick, render, forward input, drain audio.
//!
//! # Tick order
//!
//! 1. clock advance, ledger reset, message buffer rotation
//! 2. update pass over the actor list (collisions, terrain, behavior,
//!    cell membership)
//! 3. timers
//! 4. removal compaction
//!
//! Animations advance in [`Simulation::render_pass`], once per rendered
//! frame, as the render loop drives them.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::actors::{self, SpawnParams};
use crate::components::kind::Kind;
use crate::components::mapposition::MapPosition;
use crate::components::phase::Args;
use crate::components::pixelmask::PixelMask;
use crate::context::request_state;
use crate::error::Result;
use crate::events::audio::AudioCmd;
use crate::events::collision::CollisionEvent;
use crate::events::input::{InputEvent, InputKind};
use crate::resources::actorlist::{ActorList, TickLedger};
use crate::resources::eventdispatcher::EventListeners;
use crate::resources::gameconfig::GameConfig;
use crate::resources::input::InputState;
use crate::resources::physics::{ForceRegistry, PhysicsParams};
use crate::resources::terrain::{AlphaMask, Terrain, TileCoord};
use crate::resources::tilegrid::{MaskSource, TileGrid};
use crate::resources::worldtime::WorldTime;
use crate::systems::input::forward_input;
use crate::systems::phase::apply_transitions;
use crate::systems::removal::compact_removals;
use crate::systems::render::{render_pass, Renderer};
use crate::systems::time::{begin_tick, end_tick};
use crate::systems::timer::update_timers;
use crate::systems::update::update_pass;

pub struct Simulation {
    world: World,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Simulation {
    /// Fresh world with an empty terrain.
    pub fn new(config: GameConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(PhysicsParams::from_config(&config));
        world.insert_resource(Terrain::empty(
            0,
            0,
            Vec2::new(config.tile_width as f32, config.tile_height as f32),
            config.origin_y,
            config.splash_radius,
        ));
        world.insert_resource(config);
        world.init_resource::<ForceRegistry>();
        world.init_resource::<ActorList>();
        world.init_resource::<TickLedger>();
        world.init_resource::<EventListeners>();
        world.init_resource::<InputState>();
        world.init_resource::<Messages<AudioCmd>>();
        world.init_resource::<Messages<CollisionEvent>>();
        world.init_resource::<Messages<InputEvent>>();
        Self { world }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &GameConfig {
        self.world.resource::<GameConfig>()
    }

    /// Replace the terrain with the cells of `grid`.
    pub fn load_terrain(&mut self, grid: &TileGrid, masks: &dyn MaskSource) {
        let terrain = Terrain::load(grid, masks, self.world.resource::<GameConfig>());
        self.world.insert_resource(terrain);
    }

    pub fn terrain(&self) -> &Terrain {
        self.world.resource::<Terrain>()
    }

    /// Spawn a built-in kind. It takes its first turn on the next tick.
    pub fn spawn(&mut self, kind: Kind, pos: Vec2, params: &SpawnParams) -> Result<Entity> {
        actors::spawn(&mut self.world, kind, pos, params)
    }

    /// Give `entity` a sprite mask; projectile hits on it are then tested
    /// per pixel.
    pub fn set_pixel_mask(&mut self, entity: Entity, mask: AlphaMask) -> bool {
        match self.world.get_entity_mut(entity) {
            Ok(mut e) => {
                e.insert(PixelMask::new(mask));
                true
            }
            Err(_) => false,
        }
    }

    /// Transition `entity` now. `None` returns it to base behavior.
    pub fn set_state(&mut self, entity: Entity, state: Option<&str>, args: Args) {
        request_state(&mut self.world, entity, state.map(str::to_string), args);
        apply_transitions(&mut self.world, entity);
    }

    pub fn update_tick(&mut self, dt: f32) {
        begin_tick(&mut self.world, dt);
        update_pass(&mut self.world);
        update_timers(&mut self.world);
        let removed = compact_removals(&mut self.world);
        if removed > 0 {
            log::trace!("tick {}: {} removed", self.tick(), removed);
        }
        end_tick(&mut self.world);
    }

    pub fn render_pass(&mut self, scroll_x: f32, scroll_y: f32, renderer: &mut dyn Renderer) {
        render_pass(&mut self.world, Vec2::new(scroll_x, scroll_y), renderer);
    }

    /// Forward a key transition from the polling layer. Returns how many
    /// listeners heard it.
    pub fn on_input_event(&mut self, kind: InputKind, key: u32) -> usize {
        forward_input(&mut self.world, kind, key)
    }

    pub fn entities_in_tile(&self, coord: TileCoord) -> Vec<Entity> {
        self.terrain().occupants(coord).to_vec()
    }

    /// Entities in update order.
    pub fn entities(&self) -> Vec<Entity> {
        self.world.resource::<ActorList>().snapshot()
    }

    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        self.world.get::<MapPosition>(entity).map(|p| p.pos)
    }

    pub fn tick(&self) -> u64 {
        self.world.resource::<WorldTime>().tick
    }

    /// Sound requests since the last drain.
    pub fn drain_audio(&mut self) -> Vec<AudioCmd> {
        self.world
            .resource_mut::<Messages<AudioCmd>>()
            .drain()
            .collect()
    }

    pub fn drain_collisions(&mut self) -> Vec<CollisionEvent> {
        self.world
            .resource_mut::<Messages<CollisionEvent>>()
            .drain()
            .collect()
    }

    /// One-line population summary, logged by the runner.
    pub fn summary(&self) -> String {
        let list = self.world.resource::<ActorList>();
        Kind::ALL
            .iter()
            .map(|k| {
                let n = list
                    .iter()
                    .filter(|&e| self.world.get::<Kind>(e) == Some(k))
                    .count();
                (k, n)
            })
            .filter(|(_, n)| *n > 0)
            .map(|(k, n)| format!("{} {}", n, k.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
