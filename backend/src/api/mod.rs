//! REST API for the taskboard backend.
//!
//! Task CRUD lives under `/api/v1/tasks`; the orchestration probes `/health`
//! and `/ready` sit at the root so load balancers can reach them without the
//! API prefix.

pub mod error;
pub mod health;
pub mod state;
pub mod tasks;

pub use error::ApiError;
pub use health::routes as health_routes;
pub use state::AppState;
pub use tasks::routes as task_routes;
