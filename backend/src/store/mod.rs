//! Task persistence.
//!
//! Handlers depend on the [`TaskStore`] trait; [`SqliteTaskStore`] is the
//! production implementation. Writes are single statements, so two
//! concurrent updates to the same task are last-writer-wins per field: there
//! is no version column and no conflict detection.

/// Schema preparation and sample data.
pub mod bootstrap;
/// `SQLite` implementation.
pub mod sqlite;

pub use bootstrap::{BootstrapReport, bootstrap};
pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Task, TaskId, TaskPatch};

/// Errors that can occur when using the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database-related error.
    #[error("Database Error: {0}")]
    DbError(#[from] sqlx::Error),
    /// A persisted row no longer satisfies the task invariants.
    #[error("Corrupt task record {id}: {reason}")]
    CorruptRecord {
        /// Raw identifier of the row.
        id: String,
        /// What failed to decode.
        reason: String,
    },
}

/// Contract for task state access.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns every task, newest `created_at` first. Ties keep insertion
    /// order.
    ///
    /// # Errors
    /// Returns `StoreError` if the query fails or a row is malformed.
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Finds a task by ID.
    ///
    /// # Errors
    /// Returns `StoreError` if the query fails or the row is malformed.
    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Persists a newly created task.
    ///
    /// # Errors
    /// Returns `StoreError` if the insert fails.
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError>;

    /// Merges the supplied fields of `patch` into the stored task and sets
    /// `updated_at` to `now` (never moving it backwards). Returns the
    /// updated task, or `None` when no task has that ID.
    ///
    /// # Errors
    /// Returns `StoreError` if the update fails.
    async fn update_task(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError>;

    /// Hard deletes a task. Returns `false` when no task has that ID.
    ///
    /// # Errors
    /// Returns `StoreError` if the delete fails.
    async fn delete_task(&self, id: TaskId) -> Result<bool, StoreError>;
}
