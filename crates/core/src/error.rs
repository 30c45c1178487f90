//! Error types for the claims agent.
//!
//! This module defines a unified error enum that covers all error categories
//! in the workspace: configuration, I/O, completion service, retrieval,
//! tabular store, prompt and serialization errors.

use thiserror::Error;

/// Unified error type for the claims agent.
///
/// Fallible functions return `Result<T, AppError>`. Pipeline stages never let
/// one of these escape a run; they convert it into a state signal instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion service errors (transport, HTTP status, malformed body)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document ingestion and search errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Table load and SQL execution errors
    #[error("Tabular error: {0}")]
    Tabular(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
