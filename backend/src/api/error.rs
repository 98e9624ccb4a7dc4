//! API error type and the failure half of the response envelope.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::domain::ValidationError;
use crate::store::StoreError;

/// Message returned for every unclassified persistence failure.
pub const SERVER_ERROR_MESSAGE: &str = "Server Error";
/// Message returned when a task ID matches nothing.
pub const NOT_FOUND_MESSAGE: &str = "Task not found";

/// API errors for task operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input failed validation; the message reaches the client.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No task has the requested ID.
    #[error("Task not found")]
    NotFound,
    /// Store failure; logged, never shown to the client.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError::MalformedBody(rejection.body_text()))
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Validation(e) => e.to_string(),
            Self::NotFound => NOT_FOUND_MESSAGE.to_string(),
            Self::Store(e) => {
                error!(error = %e, "Task store operation failed");
                SERVER_ERROR_MESSAGE.to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (self.status(), body).into_response()
    }
}
