//! Messages exchanged with the collaborators around the core.
//!
//! Submodules:
//! - [`audio`] – sound effect requests drained by the audio backend
//! - [`collision`] – collision participants and per-collision notifications
//! - [`input`] – key press / release events forwarded by the polling layer
pub mod audio;
pub mod collision;
pub mod input;
