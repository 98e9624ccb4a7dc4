//! Task entity and its value objects.
//!
//! Every type here is validated on construction, so a `Task` in memory always
//! satisfies the entity invariants: a non-blank title, closed status and
//! priority sets, and `updated_at >= created_at`.

use chrono::{DateTime, Utc};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::ValidationError;

// =============================================================================
// Value Objects
// =============================================================================

/// Unique identifier for a task, assigned by the server at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn inner(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Task title, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Trims and validates a title.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyTitle`] if nothing remains after trimming.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskTitle {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaskTitle> for String {
    fn from(title: TaskTitle) -> Self {
        title.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Status & Priority
// =============================================================================

/// Kanban column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Parses the wire representation. Matching is exact and case sensitive.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidStatus`] for any other value.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(ValidationError::InvalidStatus(other.to_owned())),
        }
    }

    /// Returns the wire and storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low urgency.
    Low,
    /// Normal urgency.
    #[default]
    Medium,
    /// High urgency.
    High,
}

impl TaskPriority {
    /// Parses the wire representation. Matching is exact and case sensitive.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidPriority`] for any other value.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ValidationError::InvalidPriority(other.to_owned())),
        }
    }

    /// Returns the wire and storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Truncates a timestamp to the microsecond resolution the store keeps, so a
/// task returned from a write compares equal to the same task read back.
#[must_use]
pub fn storage_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

// =============================================================================
// Commands
// =============================================================================

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Task title.
    pub title: TaskTitle,
    /// Optional trimmed description.
    pub description: Option<String>,
    /// Initial status.
    pub status: TaskStatus,
    /// Initial priority.
    pub priority: TaskPriority,
}

impl NewTask {
    /// Creates a draft with default status and priority.
    #[must_use]
    pub fn new(title: TaskTitle) -> Self {
        Self {
            title,
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
        }
    }
}

/// Validated partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<TaskTitle>,
    /// Description change: `Some(None)` clears it, `Some(Some(_))` replaces
    /// it.
    pub description: Option<Option<String>>,
    /// Replacement status.
    pub status: Option<TaskStatus>,
    /// Replacement priority.
    pub priority: Option<TaskPriority>,
}

// =============================================================================
// Task Entity
// =============================================================================

/// A tracked unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    id: TaskId,
    title: TaskTitle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Materialises a new task from a validated draft. Both timestamps are
    /// set to `now`.
    #[must_use]
    pub fn create(draft: NewTask, now: DateTime<Utc>) -> Self {
        let now = storage_precision(now);
        Self {
            id: TaskId::generate(),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a task from persisted fields. `updated_at` is clamped so it
    /// never precedes `created_at`.
    #[must_use]
    pub fn restore(
        id: TaskId,
        title: TaskTitle,
        description: Option<String>,
        status: TaskStatus,
        priority: TaskPriority,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            status,
            priority,
            created_at,
            updated_at: updated_at.max(created_at),
        }
    }

    /// Returns the task ID.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the time of the last successful mutation.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single().unwrap_or_default()
    }

    #[test]
    fn title_is_trimmed() {
        let title = TaskTitle::parse("  Deploy cluster \n").unwrap();
        assert_eq!(title.as_str(), "Deploy cluster");
    }

    #[test]
    fn blank_title_is_rejected() {
        assert_eq!(TaskTitle::parse("   "), Err(ValidationError::EmptyTitle));
        assert_eq!(TaskTitle::parse(""), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn status_parsing_is_closed() {
        assert_eq!(TaskStatus::parse("in-progress"), Ok(TaskStatus::InProgress));
        assert_eq!(
            TaskStatus::parse("In-Progress"),
            Err(ValidationError::InvalidStatus("In-Progress".into()))
        );
        assert!(TaskStatus::parse("blocked").is_err());
    }

    #[test]
    fn priority_parsing_is_closed() {
        assert_eq!(TaskPriority::parse("high"), Ok(TaskPriority::High));
        assert_eq!(
            TaskPriority::parse("urgent"),
            Err(ValidationError::InvalidPriority("urgent".into()))
        );
    }

    #[test]
    fn create_applies_defaults_and_equal_timestamps() {
        let task = Task::create(NewTask::new(TaskTitle::parse("Write docs").unwrap()), fixed_time());

        assert_eq!(task.status(), TaskStatus::Todo);
        assert_eq!(task.priority(), TaskPriority::Medium);
        assert_eq!(task.created_at(), task.updated_at());
        assert_eq!(task.created_at(), fixed_time());
    }

    #[test]
    fn created_ids_are_unique() {
        let draft = NewTask::new(TaskTitle::parse("Same title").unwrap());
        let a = Task::create(draft.clone(), fixed_time());
        let b = Task::create(draft, fixed_time());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn restore_never_lets_updated_precede_created() {
        let created = fixed_time();
        let earlier = created - chrono::Duration::seconds(30);
        let task = Task::restore(
            TaskId::generate(),
            TaskTitle::parse("Clock skew").unwrap(),
            None,
            TaskStatus::Done,
            TaskPriority::Low,
            created,
            earlier,
        );
        assert_eq!(task.updated_at(), created);
    }

    #[test]
    fn serializes_with_client_field_names() {
        let task = Task::create(NewTask::new(TaskTitle::parse("Ship it").unwrap()), fixed_time());
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["_id"], task.id().to_string());
        assert_eq!(json["status"], "todo");
        assert_eq!(json["priority"], "medium");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn storage_precision_drops_nanoseconds() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).single().unwrap_or_default();
        assert_eq!(storage_precision(ts).timestamp_subsec_nanos(), 123_456_000);
    }
}
