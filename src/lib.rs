//! Tremolo simulation core.
//!
//! The per-tick core of a destructible-terrain side scroller: entity state
//! machines, a force-field physics integrator, box and pixel collision
//! against a tile grid, timer and animation schedulers and a named-event
//! dispatcher. Windowing, asset loading and audio playback live outside; they
//! talk to the core through [`game::Simulation`].

pub mod actors;
pub mod components;
pub mod context;
pub mod error;
pub mod events;
pub mod game;
pub mod resources;
pub mod selection;
pub mod systems;
