// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::gc::CleanupPhase;

#[derive(Error, Debug)]
pub enum ModeljobError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Dataflow not found: {0}")]
    DataflowNotFound(String),

    #[error("Index plan not found for model: {0}")]
    IndexPlanNotFound(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Cycle detected in job DAG: {0}")]
    DagCycle(String),

    #[error("Inconsistent DAG edge: {0}")]
    DagEdge(String),

    #[error("Cleanup failed for project '{project}' during {phase}: {source}")]
    CleanupFailed {
        project: String,
        phase: CleanupPhase,
        #[source]
        source: Box<ModeljobError>,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ModeljobError>;
