//! # Engine Error Types
//!
//! All errors that can occur while configuring or driving the engine.
//! Degraded per-tick states (no support, ray miss, empty slot) are outcomes,
//! not errors.

use std::path::PathBuf;

use strata_procedural::WorldError;
use thiserror::Error;

/// Errors raised while loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML did not parse.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur in the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be used.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A world edit or lookup failed.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
