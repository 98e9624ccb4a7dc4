//! API Handler implementations for task management.
//!
//! Each handler validates its input before touching the store. Store
//! failures become a generic server error; nothing here retries or holds a
//! lock, so concurrent writes to one task resolve in the store.

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::tasks::types::{
    CreateTaskRequest, DeletedResponse, TaskListResponse, TaskResponse, UpdateTaskRequest,
};
use crate::domain::{Task, TaskId};
use crate::infrastructure::audit::{self, AuditEvent};

/// Unparseable IDs cannot name a stored task, so they are reported the same
/// way as unknown ones.
fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

fn record<T>(operation: &'static str, result: &Result<T, ApiError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(ApiError::Validation(_)) => "invalid",
        Err(ApiError::NotFound) => "not_found",
        Err(ApiError::Store(_)) => "error",
    };
    metrics::counter!(
        "taskboard_task_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// GET /api/v1/tasks
///
/// Lists every task, newest first.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let result = state
        .store()
        .list_tasks()
        .await
        .map(|tasks| Json(TaskListResponse::from(tasks)))
        .map_err(ApiError::from);
    record("list", &result);
    result
}

/// GET /api/v1/tasks/{id}
///
/// Fetches a single task.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let result = find(&state, &id).await.map(|task| Json(TaskResponse::from(task)));
    record("get", &result);
    result
}

/// POST /api/v1/tasks
///
/// Creates a task with a server-assigned ID and timestamps.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let result = create(&state, payload)
        .await
        .map(|task| (StatusCode::CREATED, Json(TaskResponse::from(task))));
    record("create", &result);
    result
}

/// PUT /api/v1/tasks/{id}
///
/// Applies a partial update and refreshes `updatedAt`.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let result = update(&state, &id, payload)
        .await
        .map(|task| Json(TaskResponse::from(task)));
    record("update", &result);
    result
}

/// DELETE /api/v1/tasks/{id}
///
/// Hard deletes a task.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let result = delete(&state, &id)
        .await
        .map(|()| Json(DeletedResponse::default()));
    record("delete", &result);
    result
}

async fn find(state: &AppState, raw_id: &str) -> Result<Task, ApiError> {
    let id = parse_task_id(raw_id)?;
    state.store().find_task(id).await?.ok_or(ApiError::NotFound)
}

async fn create(
    state: &AppState,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<Task, ApiError> {
    let Json(request) = payload?;
    let task = Task::create(request.into_new_task()?, Utc::now());
    state.store().insert_task(&task).await?;
    info!(task_id = %task.id(), "Task created");
    Ok(task)
}

async fn update(
    state: &AppState,
    raw_id: &str,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Task, ApiError> {
    let id = parse_task_id(raw_id)?;
    let Json(request) = payload?;
    let patch = request.into_patch()?;
    let task = state
        .store()
        .update_task(id, &patch, Utc::now())
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(task_id = %id, "Task updated");
    Ok(task)
}

async fn delete(state: &AppState, raw_id: &str) -> Result<(), ApiError> {
    let id = parse_task_id(raw_id)?;
    if !state.store().delete_task(id).await? {
        return Err(ApiError::NotFound);
    }
    info!(task_id = %id, "Task deleted");
    audit::log_audit(&AuditEvent::TaskDeleted {
        task_id: id.to_string(),
    });
    Ok(())
}
