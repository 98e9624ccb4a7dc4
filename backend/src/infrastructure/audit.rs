use serde::Serialize;
use tracing::{info, info_span};

/// Lifecycle event for audit logging.
/// Structured for JSON serialization to enable machine-readable audit trails.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// The HTTP listener is bound and accepting traffic.
    ServiceStarted {
        /// Deployment environment label.
        environment: String,
        /// Bound socket address.
        address: String,
    },
    /// The process is leaving the serving phase.
    ServiceStopped {
        /// Why the service stopped.
        reason: String,
    },
    /// The startup connection succeeded.
    DatabaseConnected {
        /// Resolved backend host.
        host: String,
    },
    /// The startup connection gave up.
    DatabaseUnavailable {
        /// Attempts made before giving up.
        attempts: u32,
    },
    /// A task was hard deleted.
    TaskDeleted {
        /// Identifier of the removed task.
        task_id: String,
    },
}

/// Logs an audit event to the dedicated audit channel as structured JSON.
/// This uses a specific `target` which can be filtered by the subscriber to redirect to a secure file.
pub fn log_audit(event: &AuditEvent) {
    let span = info_span!(target: "audit", "audit_event");
    let _enter = span.enter();

    // Serialize to JSON for machine-readable audit logs
    let json = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
    info!(target: "audit", audit_json = %json, "Lifecycle Audit Event");
}
