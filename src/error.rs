//! Error types for session-cleaner.

use thiserror::Error;

use crate::config::ConfigError;
use crate::session::IdError;

/// Main error type for session store operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The ID provider failed to produce an identifier.
    #[error("session id generation failed: {0}")]
    IdGeneration(#[from] IdError),

    /// Session with the given ID was not found (never created or evicted).
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The ID provider returned an identifier that is still live.
    #[error("session already exists: {0}")]
    SessionExists(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// The store was constructed outside of a tokio runtime.
    #[error("no tokio runtime available to schedule session expiry")]
    NoRuntime,

    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience Result type for session store operations.
pub type Result<T> = std::result::Result<T, SessionError>;
