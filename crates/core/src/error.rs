//! Error types for the docqa assistant.
//!
//! This module defines a unified error enum covering all error categories
//! in the application: configuration, ingestion, external service calls,
//! index state, prompt rendering, and I/O.

use thiserror::Error;

/// Unified error type for the docqa assistant.
///
/// All library functions return `Result<T, AppError>`. Errors stay typed
/// until the CLI boundary, where they are formatted for display.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration problems (missing credential, invalid option values).
    /// Fatal at construction time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Knowledge base ingestion problems (unreadable file, malformed JSON,
    /// empty extraction set). No partial state is retained.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// External service failures (embedding or chat API: auth, rate limit,
    /// network). Scoped to the current operation only.
    #[error("Service error: {0}")]
    Service(String),

    /// Vector index problems (persistence, format mismatch).
    #[error("Index error: {0}")]
    Index(String),

    /// Query issued before any index was built. Handled locally by the
    /// assistant, which substitutes a fixed guidance message.
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
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
