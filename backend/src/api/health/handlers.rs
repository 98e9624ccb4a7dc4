//! Probe handlers.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::api::health::types::{DatabaseState, HealthResponse, ReadinessResponse};
use crate::api::state::AppState;

fn health_report(state: &AppState) -> HealthResponse {
    HealthResponse {
        uptime: state.uptime().as_secs_f64(),
        message: "OK".to_string(),
        timestamp: Utc::now().timestamp_millis(),
        environment: state.environment().to_string(),
        database: DatabaseState::from_connected(state.connection().is_connected()),
    }
}

/// GET /health
///
/// Liveness. Reports 503 only if the payload itself cannot be produced.
pub async fn liveness(State(state): State<Arc<AppState>>) -> Response {
    let report = health_report(&state);
    match serde_json::to_value(&report) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to build health payload");
            let mut body: Value = json!({
                "uptime": report.uptime,
                "timestamp": report.timestamp,
                "environment": report.environment,
                "database": report.database,
            });
            body["message"] = Value::String(e.to_string());
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// GET /ready
///
/// Readiness. 200 only while the database connection is live.
pub async fn readiness(State(state): State<Arc<AppState>>) -> Response {
    let readiness = ReadinessResponse::from_connected(state.connection().is_connected());
    let status = if readiness.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness)).into_response()
}
