// sojourner_sim/src/error.rs

use std::path::PathBuf;

use sojourner_core::error::PerceptionError;
use thiserror::Error;

/// Everything that can stop a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("perception error: {0}")]
    Perception(#[from] PerceptionError),

    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    #[error("scenario file not found: {}", .0.display())]
    ScenarioNotFound(PathBuf),

    #[error("failed to serialize scenario: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid scenario: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
