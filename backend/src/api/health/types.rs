//! Probe payloads.

use serde::Serialize;

/// Database state as reported by the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseState {
    /// The connection manager holds a live pool.
    Connected,
    /// No live pool.
    Disconnected,
}

impl DatabaseState {
    /// Maps the connection flag onto the reported state.
    #[must_use]
    pub const fn from_connected(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}

/// Liveness payload.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Seconds since the service state was created.
    pub uptime: f64,
    /// `OK`, or the failure when the payload could not be produced.
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Deployment environment label.
    pub environment: String,
    /// Connection state at the time of the check.
    pub database: DatabaseState,
}

/// Readiness payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadinessResponse {
    /// `ready` or `not ready`.
    pub status: &'static str,
    /// Connection state.
    pub database: DatabaseState,
}

impl ReadinessResponse {
    /// Builds the payload for a connection flag.
    #[must_use]
    pub const fn from_connected(connected: bool) -> Self {
        Self {
            status: if connected { "ready" } else { "not ready" },
            database: DatabaseState::from_connected(connected),
        }
    }

    /// Whether the service should receive traffic.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.database, DatabaseState::Connected)
    }
}
