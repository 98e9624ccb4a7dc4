//! Orchestration probes.
//!
//! `/health` answers whether the process is alive and never touches the
//! store. `/ready` answers whether traffic should be routed here, which is
//! exactly whether the connection manager reports a live connection.

pub mod handlers;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::api::state::AppState;
use handlers::{liveness, readiness};

/// Probe routes, mounted at the root.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
}
