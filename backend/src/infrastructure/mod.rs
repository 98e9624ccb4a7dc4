/// Audit logging for lifecycle events.
pub mod audit;
/// Configuration management for the backend.
pub mod config;
/// HTTP router assembly and middleware.
pub mod server;
/// Telemetry setup for logging and tracing.
pub mod telemetry;
