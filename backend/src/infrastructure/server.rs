use axum::{
    http::{header, HeaderName, HeaderValue},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::api::{health_routes, task_routes, AppState};
use crate::infrastructure::config::ServerSettings;

const SECURITY_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::X_DNS_PREFETCH_CONTROL, "off"),
];

/// Installs the global Prometheus recorder.
///
/// Only one recorder can exist per process; a second call logs a warning
/// and returns `None`, leaving `/metrics` unmounted.
#[must_use]
pub fn install_metrics_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder unavailable: {e}");
            None
        }
    }
}

/// Builds the CORS layer. `*` (or an empty list) allows any origin;
/// otherwise only the listed origins are echoed back. Origins that are not
/// valid header values are skipped with a warning.
#[must_use]
pub fn cors_layer(settings: &ServerSettings) -> CorsLayer {
    let origin = match settings.allowed_origins() {
        None => AllowOrigin::from(Any),
        Some(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Assembles the full application: probes, task API, optional `/metrics`,
/// CORS, security headers and per-request tracing.
pub fn build_router(
    state: Arc<AppState>,
    settings: &ServerSettings,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let mut app = health_routes().merge(task_routes());

    if let Some(handle) = metrics {
        app = app.route("/metrics", get(move || std::future::ready(handle.render())));
    }

    let mut app = app.with_state(state);

    for (name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ));
    }

    app.layer(cors_layer(settings))
        .layer(TraceLayer::new_for_http())
}
