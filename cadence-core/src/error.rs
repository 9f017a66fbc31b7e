//! Error taxonomy for the scheduling core.
//!
//! Only precondition and collaborator failures surface as errors. Missing
//! history is an `Option`, and malformed external input is skipped where it
//! is read.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No preferences/profile: no work window can be derived.
    #[error("user preferences are missing; cannot derive a work window")]
    MissingPreferences,

    #[error("task '{0}' not found")]
    TaskNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A store or other collaborator failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;
