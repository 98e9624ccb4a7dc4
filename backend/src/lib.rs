//! Taskboard backend - task tracking REST service.
//!
//! This crate provides the HTTP API for creating, listing, updating and
//! deleting tasks, the `SQLite` persistence behind it, connection management
//! with bounded startup retry, liveness/readiness probes, and the process
//! supervisor that orders startup and graceful shutdown.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// HTTP handlers, request/response types and shared state.
pub mod api;
/// Database connection management and startup retry.
pub mod connection;
/// Task entity, value types and validation errors.
pub mod domain;
/// Infrastructure components (config, server, telemetry, audit).
pub mod infrastructure;
/// Task persistence.
pub mod store;
/// Process lifecycle supervision.
pub mod supervisor;
