//! Server configuration for the taskboard backend.
//!
//! This module defines HTTP binding, cross-origin and shutdown settings.

use serde::Deserialize;

/// Server binding settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Comma-separated origins allowed by CORS, or `*` for any origin.
    pub cors_origin: String,
    /// Seconds in-flight requests may run after a shutdown signal before the
    /// database connection is closed anyway.
    pub drain_timeout_secs: u64,
}

impl ServerSettings {
    /// Explicit origins, or `None` when every origin is allowed.
    #[must_use]
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_origin
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_owned)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }
}
