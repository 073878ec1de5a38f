//! # Task abstraction.
//!
//! A [`Task`] is a named unit of work that runs for the life of the process
//! under the task group. The common handle type is [`TaskRef`], an
//! `Arc<dyn Task>` suitable for sharing across the runtime.
//!
//! A task receives the shared [`CancellationToken`] and should watch it to
//! stop cooperatively once shutdown begins. Tasks that never look at the token
//! simply run to natural completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future returned by [`Task::spawn`] and [`Hook::process`](crate::Hook::process).
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handle to a task object.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cooperatively cancelable unit.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use gracevisor::{BoxTaskFuture, Task};
///
/// struct Ticker;
///
/// impl Task for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             ctx.cancelled().await;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Creates the future executing this task.
    ///
    /// `ctx` is the orchestrator-wide token; it fires on a termination request
    /// or on the first failure of any background task.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
