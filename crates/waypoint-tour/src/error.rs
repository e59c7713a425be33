#![forbid(unsafe_code)]

use thiserror::Error;

use crate::options::StepId;

pub type Result<T> = std::result::Result<T, TourError>;

/// Misuse of a tour or step.
///
/// Not-found conditions (unknown step keys, selectors matching nothing) are
/// not errors: they degrade to no-ops or centered placement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourError {
    #[error("step {id} has been destroyed")]
    StepDestroyed { id: StepId },

    #[error("step {id} does not belong to a live tour")]
    Detached { id: StepId },

    #[error("a step with id {id} already exists in this tour")]
    DuplicateStepId { id: StepId },
}

/// Failure loading a tour definition.
#[cfg(feature = "config")]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Tour(#[from] TourError),
}
