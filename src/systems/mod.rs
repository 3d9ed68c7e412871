//! Simulation systems.
//!
//! Every system is an exclusive pass over the [`World`](bevy_ecs::world::World)
//! because behavior callbacks may touch any entity or resource.
//!
//! Submodules overview
//! - [`animation`] – advance entity animations, animation groups and tile effects
//! - [`collision`] – entity broad phase, pixel refinement, terrain contact and cell membership
//! - [`input`] – forward key transitions into [`crate::resources::input::InputState`] and the dispatcher
//! - [`phase`] – run behaviors and apply queued state transitions
//! - [`removal`] – deferred despawn at the tick boundary
//! - [`render`] – cull and emit draw calls through the [`render::Renderer`] trait
//! - [`time`] – update simulation time and reset per-tick bookkeeping
//! - [`timer`] – fire due entity timers
//! - [`update`] – the per-entity world update pass

pub mod animation;
pub mod collision;
pub mod input;
pub mod phase;
pub mod removal;
pub mod render;
pub mod time;
pub mod timer;
pub mod update;
