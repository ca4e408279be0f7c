//! Error types for cdcr.

use thiserror::Error;

/// Result type for session and configuration operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised at the annotation session boundary.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    /// Network or storage failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credentials were rejected; the annotator must log in again.
    #[error("Authentication expired")]
    AuthExpired,

    /// An operation was attempted while logged out.
    #[error("Not logged in")]
    LoggedOut,

    /// The requested task does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No task is loaded.
    #[error("No active task")]
    NoTask,

    /// Settings could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// The core rejected the request (malformed task, bad span, ...).
    #[error(transparent)]
    Core(#[from] cdcr_core::Error),
}

impl SessionError {
    /// Create a transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a config error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors that end the login.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthExpired | Self::LoggedOut)
    }
}
