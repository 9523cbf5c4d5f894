//! # Simulation Error Types
//!
//! Only startup can fail. Inside a step every failure mode degrades to a
//! no-op, an empty result or a recorded [`SimWarning`].

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityKind;

/// Errors raised while building a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::SimConfig`].
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config parsed but violates a constraint.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for startup operations.
pub type SimResult<T> = Result<T, SimError>;

/// Recoverable conditions recorded while the simulation keeps running.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimWarning {
    /// A directory was configured without a template for its entity kind and
    /// fell back to the built-in one.
    #[error("no {kind} template configured, using built-in fallback")]
    MissingTemplate {
        /// Entity kind the directory manages.
        kind: EntityKind,
    },
}
