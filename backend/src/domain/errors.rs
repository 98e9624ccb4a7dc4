//! Domain errors - Validation failures for task input
//!
//! Messages are part of the public API: they are passed through to the
//! client verbatim in the `error` field of the response envelope.

use thiserror::Error;

/// Error type for task validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title was not supplied on create.
    #[error("Task validation failed: title: Path `title` is required.")]
    MissingTitle,
    /// Title is empty or whitespace-only.
    #[error("Task validation failed: title: Path `title` cannot be empty.")]
    EmptyTitle,
    /// Status is outside `todo`, `in-progress`, `done`.
    #[error("Task validation failed: status: `{0}` is not a valid enum value for path `status`.")]
    InvalidStatus(String),
    /// Priority is outside `low`, `medium`, `high`.
    #[error("Task validation failed: priority: `{0}` is not a valid enum value for path `priority`.")]
    InvalidPriority(String),
    /// The request body could not be decoded.
    #[error("Invalid request body: {0}")]
    MalformedBody(String),
}
