//! Error type for configuration and construction failures.
//!
//! Only construction-time problems are errors. Out-of-range queries return
//! `None` and state-machine misuse is logged, so nothing at tick time ever
//! produces a [`SimError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A spawn or construction call is missing a parameter it cannot default.
    #[error("{kind} requires parameter `{param}`")]
    MissingParam {
        kind: &'static str,
        param: &'static str,
    },
    /// The tile grid descriptor is empty or ragged.
    #[error("invalid tile grid: {0}")]
    InvalidGrid(String),
    /// The INI configuration could not be read.
    #[error("config error: {0}")]
    Config(String),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
