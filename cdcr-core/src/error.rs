//! Error types for cdcr-core.

use thiserror::Error;

/// Result type for cdcr-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cdcr-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A mention key that is not of the form `label;start;end`.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A span that does not fit inside its document.
    #[error("Span [{start}, {end}) out of bounds for document of {len} chars")]
    OutOfBounds {
        /// Start offset (chars).
        start: usize,
        /// End offset (chars).
        end: usize,
        /// Document length (chars).
        len: usize,
    },

    /// Two spans intersect without one containing the other.
    #[error("Crossing spans: {first} and {second}")]
    CrossingSpan {
        /// Key of the earlier span.
        first: String,
        /// Key of the later span.
        second: String,
    },

    /// A task that cannot be submitted as-is.
    #[error("Malformed task: {0}")]
    MalformedTask(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a malformed task error.
    #[must_use]
    pub fn malformed_task(msg: impl Into<String>) -> Self {
        Self::MalformedTask(msg.into())
    }

    /// Create an out-of-bounds error.
    #[must_use]
    pub fn out_of_bounds(start: usize, end: usize, len: usize) -> Self {
        Self::OutOfBounds { start, end, len }
    }
}
