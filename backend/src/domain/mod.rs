//! Domain Layer - Task entity and value objects
//!
//! Invalid states are unrepresentable: status and priority are closed enums
//! and titles can only be built through validation.

pub mod errors;
pub mod task;

pub use errors::ValidationError;
pub use task::{
    NewTask, Task, TaskId, TaskPatch, TaskPriority, TaskStatus, TaskTitle, storage_precision,
};
