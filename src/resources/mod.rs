//! ECS resources shared by the simulation.
//!
//! Overview
//! - `actorlist` – entities in update order, deferred removals, per-tick pair ledger
//! - `eventdispatcher` – named-event fan-out to listener entities
//! - `gameconfig` – INI-backed tunables
//! - `input` – keys currently held
//! - `physics` – force-source registry, field computation and integration
//! - `terrain` – destructible tile grid with opacity masks
//! - `tilegrid` – level grid descriptors and terrain construction
//! - `worldtime` – simulation clock
pub mod actorlist;
pub mod eventdispatcher;
pub mod gameconfig;
pub mod input;
pub mod physics;
pub mod terrain;
pub mod tilegrid;
pub mod worldtime;
