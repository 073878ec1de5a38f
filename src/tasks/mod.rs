//! # Background task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async tasks supervised by the task group
//! - [`TaskFn`] - context-aware, function-backed task (receives the shared token)
//! - [`PlainFn`] - function-backed task without access to the shared token
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)

mod task;
mod task_fn;

pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::{PlainFn, TaskFn};
