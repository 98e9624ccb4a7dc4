//! REST API endpoints for task management.

pub mod handlers;
pub mod routes;
pub mod types;

pub use routes::routes;
