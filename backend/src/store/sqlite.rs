//! `SQLite`-backed task store.
//!
//! Timestamps are stored as integer microseconds since the Unix epoch, so
//! ordering by `created_at` is numeric and independent of text formatting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    Row,
    sqlite::{SqlitePool, SqliteRow},
};
use tracing::instrument;

use crate::domain::{
    Task, TaskId, TaskPatch, TaskPriority, TaskStatus, TaskTitle, storage_precision,
};
use crate::store::{StoreError, TaskStore};

const TASK_COLUMNS: &str = "id, title, description, status, priority, created_at, updated_at";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT,
    status TEXT NOT NULL DEFAULT 'todo' CHECK (status IN ('todo', 'in-progress', 'done')),
    priority TEXT NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)";

/// Task store over a shared `SQLite` pool.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    /// Creates a store over `pool`. The pool stays owned by the connection
    /// manager; this is a shared handle.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the `tasks` table if it is missing. Indexes are left to
    /// [`crate::store::bootstrap`]; queries are correct without them.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Counts stored tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_tasks(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    #[instrument(skip(self))]
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, rowid ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_task).collect()
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_task).transpose()
    }

    #[instrument(skip(self, task), fields(task_id = %task.id()))]
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tasks (id, title, description, status, priority, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.id().to_string())
        .bind(task.title().as_str())
        .bind(task.description())
        .bind(task.status().as_str())
        .bind(task.priority().as_str())
        .bind(task.created_at().timestamp_micros())
        .bind(task.updated_at().timestamp_micros())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, patch), fields(task_id = %id))]
    async fn update_task(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "UPDATE tasks SET
                title = COALESCE(?, title),
                description = CASE WHEN ? THEN ? ELSE description END,
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                updated_at = MAX(?, updated_at)
             WHERE id = ?
             RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(patch.title.as_ref().map(TaskTitle::as_str))
            .bind(patch.description.is_some())
            .bind(patch.description.as_ref().and_then(|d| d.as_deref()))
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.priority.map(|p| p.as_str()))
            .bind(storage_precision(now).timestamp_micros())
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_task).transpose()
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete_task(&self, id: TaskId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_task(row: &SqliteRow) -> Result<Task, StoreError> {
    let raw_id: String = row.try_get("id")?;
    let corrupt = |reason: String| StoreError::CorruptRecord {
        id: raw_id.clone(),
        reason,
    };

    let id = raw_id
        .parse::<TaskId>()
        .map_err(|e| corrupt(format!("id: {e}")))?;
    let title = TaskTitle::parse(&row.try_get::<String, _>("title")?)
        .map_err(|e| corrupt(e.to_string()))?;
    let status = TaskStatus::parse(&row.try_get::<String, _>("status")?)
        .map_err(|e| corrupt(e.to_string()))?;
    let priority = TaskPriority::parse(&row.try_get::<String, _>("priority")?)
        .map_err(|e| corrupt(e.to_string()))?;
    let created_at = micros_to_datetime(row.try_get("created_at")?)
        .ok_or_else(|| corrupt("created_at out of range".into()))?;
    let updated_at = micros_to_datetime(row.try_get("updated_at")?)
        .ok_or_else(|| corrupt("updated_at out of range".into()))?;

    Ok(Task::restore(
        id,
        title,
        row.try_get("description")?,
        status,
        priority,
        created_at,
        updated_at,
    ))
}

fn micros_to_datetime(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}
