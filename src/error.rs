//! Error types for the dialogue template compiler.

use crate::plan::{StepType, UnitOfWork};
use crate::schema::path::NodePath;
use thiserror::Error;

/// Failures reported by the external content-generation collaborator.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("Generator transport error: {0}")]
    Transport(String),

    #[error("Generator rejected unit: {0}")]
    Rejected(String),

    #[error("Generator rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Generator returned malformed payload: {0}")]
    MalformedPayload(String),
}

/// Compilation-level errors.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Generation failed for unit {unit}: {source}")]
    GenerationFailed {
        unit: UnitOfWork,
        source: GenerateError,
    },

    #[error("Generation run is not in a failed state; nothing to retry")]
    NothingToRetry,

    #[error("Generation run already completed")]
    RunAlreadyDone,

    #[error("Duplicate translation key: {0}")]
    DuplicateTranslationKey(String),

    #[error("Step type {step_type:?} is not legal for child node at {path}")]
    IllegalChildStep { path: NodePath, step_type: StepType },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for CompileError {
    fn from(err: config::ConfigError) -> Self {
        CompileError::ConfigError(err.to_string())
    }
}
