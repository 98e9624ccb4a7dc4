//! Request/Response Types for Task API
//!
//! Requests arrive as loosely typed JSON and are turned into validated
//! domain commands here, so handlers never see an unchecked value.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus, TaskTitle, ValidationError};

/// Request to create a task. Unknown fields, including server-owned ones
/// such as `_id` or `createdAt`, are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    /// Required title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional status, defaults to `todo`.
    pub status: Option<String>,
    /// Optional priority, defaults to `medium`.
    pub priority: Option<String>,
}

impl CreateTaskRequest {
    /// Validates the request into a creation command.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found.
    pub fn into_new_task(self) -> Result<NewTask, ValidationError> {
        let title = self.title.ok_or(ValidationError::MissingTitle)?;
        Ok(NewTask {
            title: TaskTitle::parse(&title)?,
            description: self.description.map(|d| d.trim().to_owned()),
            status: self
                .status
                .as_deref()
                .map(TaskStatus::parse)
                .transpose()?
                .unwrap_or_default(),
            priority: self
                .priority
                .as_deref()
                .map(TaskPriority::parse)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// Partial update. Absent fields keep their stored value, as does an
/// explicit `null` for title, status or priority. An explicit `null`
/// description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    /// Replacement title.
    pub title: Option<String>,
    /// Description change; `Some(None)` is an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    /// Replacement status.
    pub status: Option<String>,
    /// Replacement priority.
    pub priority: Option<String>,
}

impl UpdateTaskRequest {
    /// Validates the supplied fields into a patch.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found.
    pub fn into_patch(self) -> Result<TaskPatch, ValidationError> {
        Ok(TaskPatch {
            title: self.title.as_deref().map(TaskTitle::parse).transpose()?,
            description: self
                .description
                .map(|d| d.map(|d| d.trim().to_owned())),
            status: self.status.as_deref().map(TaskStatus::parse).transpose()?,
            priority: self.priority.as_deref().map(TaskPriority::parse).transpose()?,
        })
    }
}

/// Marks a field as present, so `null` becomes `Some(None)` while an absent
/// field stays `None` through `#[serde(default)]`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Single task envelope.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    /// Always `true`.
    pub success: bool,
    /// The task.
    pub data: Task,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            success: true,
            data: task,
        }
    }
}

/// Task list envelope.
#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    /// Always `true`.
    pub success: bool,
    /// Number of tasks in `data`.
    pub count: usize,
    /// Tasks, newest first.
    pub data: Vec<Task>,
}

impl From<Vec<Task>> for TaskListResponse {
    fn from(tasks: Vec<Task>) -> Self {
        Self {
            success: true,
            count: tasks.len(),
            data: tasks,
        }
    }
}

/// Empty object placed in `data` after a delete.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Empty {}

/// Delete acknowledgment envelope: `{"success": true, "data": {}}`.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    /// Always `true`.
    pub success: bool,
    /// Always empty.
    pub data: Empty,
}

impl Default for DeletedResponse {
    fn default() -> Self {
        Self {
            success: true,
            data: Empty {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_title() {
        let err = CreateTaskRequest::default().into_new_task().unwrap_err();
        assert_eq!(err, ValidationError::MissingTitle);
    }

    #[test]
    fn create_rejects_blank_title() {
        let request = CreateTaskRequest {
            title: Some(" \t ".into()),
            ..CreateTaskRequest::default()
        };
        assert_eq!(request.into_new_task().unwrap_err(), ValidationError::EmptyTitle);
    }

    #[test]
    fn create_applies_defaults_and_trims() {
        let request = CreateTaskRequest {
            title: Some(" Deploy cluster ".into()),
            description: Some("  kubeadm  ".into()),
            priority: Some("high".into()),
            ..CreateTaskRequest::default()
        };
        let draft = request.into_new_task().unwrap();

        assert_eq!(draft.title.as_str(), "Deploy cluster");
        assert_eq!(draft.description.as_deref(), Some("kubeadm"));
        assert_eq!(draft.status, TaskStatus::Todo);
        assert_eq!(draft.priority, TaskPriority::High);
    }

    #[test]
    fn create_rejects_unknown_enum_values() {
        let request = CreateTaskRequest {
            title: Some("ok".into()),
            status: Some("archived".into()),
            ..CreateTaskRequest::default()
        };
        assert_eq!(
            request.into_new_task().unwrap_err(),
            ValidationError::InvalidStatus("archived".into())
        );
    }

    #[test]
    fn update_keeps_absent_fields_unset() {
        let patch: UpdateTaskRequest =
            serde_json::from_str(r#"{"status":"done","createdAt":"1999-01-01"}"#).unwrap();
        let patch = patch.into_patch().unwrap();

        assert_eq!(patch.status, Some(TaskStatus::Done));
        assert!(patch.title.is_none());
        assert!(patch.description.is_none());
        assert!(patch.priority.is_none());
    }

    #[test]
    fn update_distinguishes_null_description_from_absent() {
        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.into_patch().unwrap().description, Some(None));

        let replaced: UpdateTaskRequest =
            serde_json::from_str(r#"{"description":"  new notes "}"#).unwrap();
        assert_eq!(
            replaced.into_patch().unwrap().description,
            Some(Some("new notes".to_string()))
        );

        let untouched: UpdateTaskRequest = serde_json::from_str(r#"{"title":null}"#).unwrap();
        let patch = untouched.into_patch().unwrap();
        assert!(patch.description.is_none());
        assert!(patch.title.is_none());
    }

    #[test]
    fn update_rejects_blank_title_and_bad_priority() {
        let blank = UpdateTaskRequest {
            title: Some("   ".into()),
            ..UpdateTaskRequest::default()
        };
        assert_eq!(blank.into_patch().unwrap_err(), ValidationError::EmptyTitle);

        let bad = UpdateTaskRequest {
            priority: Some("critical".into()),
            ..UpdateTaskRequest::default()
        };
        assert!(matches!(
            bad.into_patch(),
            Err(ValidationError::InvalidPriority(p)) if p == "critical"
        ));
    }

    #[test]
    fn delete_envelope_has_empty_data() {
        let json = serde_json::to_value(DeletedResponse::default()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": {}}));
    }
}
