//! ECS components for simulated entities.
//!
//! Components hold per-entity data only. Behavior lives in the callbacks
//! stored on [`phase::Phase`] and runs through
//! [`EntityContext`](crate::context::EntityContext).
//!
//! Submodules overview:
//! - [`animation`] – frame sequences, timing policy and the per-entity animator
//! - [`animgroup`] – named transient animations attached to one owner
//! - [`boxcollider`] – shrunk axis-aligned box for the broad phase
//! - [`forcesource`] – attractive/repulsive point field parameters
//! - [`inputcontrolled`] – keyboard capability and key bindings
//! - [`kind`] – built-in kind tag
//! - [`liveness`] – idle / expired / frozen flags
//! - [`mapposition`] – world-space position (sprite centre)
//! - [`phase`] – per-entity state machine with base behavior fallback
//! - [`pixelmask`] – sprite opacity mask for pixel-accurate hits
//! - [`rigidbody`] – physics flags, accumulated time and launch velocity
//! - [`seatable`] – vehicle capability and seated drivers
//! - [`signals`] – per-entity blackboard
//! - [`sprite`] – visual footprint
//! - [`terrainimpact`] – how terrain reacts when the entity lands
//! - [`tilemember`] – terrain cell currently listing the entity
//! - [`timer`] – named one-shot and repeating timers

pub mod animation;
pub mod animgroup;
pub mod boxcollider;
pub mod forcesource;
pub mod inputcontrolled;
pub mod kind;
pub mod liveness;
pub mod mapposition;
pub mod phase;
pub mod pixelmask;
pub mod rigidbody;
pub mod seatable;
pub mod signals;
pub mod sprite;
pub mod terrainimpact;
pub mod tilemember;
pub mod timer;
