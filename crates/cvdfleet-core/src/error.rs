//! Core error types for cvdfleet-core

use thiserror::Error;

/// Errors that can occur in core orchestration operations
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Action tag not part of the vocabulary
    #[error("unhandled action tag: {0}")]
    UnhandledAction(String),

    /// Action payload missing or malformed
    #[error("malformed action payload: {0}")]
    MalformedAction(String),

    /// Backend request failed
    #[error("backend request failed: {0}")]
    Backend(String),

    /// Actor communication error
    #[error("actor communication error: {0}")]
    ActorError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}
