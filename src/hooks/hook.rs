//! # Shutdown hook abstraction.
//!
//! A [`Hook`] runs once, after termination has been requested. It receives a
//! [`CancellationToken`] bound to the shutdown deadline (and, with
//! `cancel_on_error`, to the first hook failure). Hooks should observe it:
//! the coordinator stops *waiting* when it fires but never interrupts the
//! hook's own work.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::hooks::id::HookId;
use crate::tasks::BoxTaskFuture;

/// Shared handle to a hook object.
pub type HookRef = Arc<dyn Hook>;

/// Cleanup work executed during shutdown.
pub trait Hook: Send + Sync + 'static {
    /// Creates the future executing the cleanup.
    fn process(&self, ctx: CancellationToken) -> BoxTaskFuture;
}

/// Function-backed hook wrapping `F: Fn(CancellationToken) -> Fut`.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use gracevisor::{HookFn, HookRef, TaskError};
///
/// let flush: HookRef = HookFn::arc(|ctx: CancellationToken| async move {
///     tokio::select! {
///         _ = ctx.cancelled() => Err(TaskError::Canceled),
///         _ = tokio::time::sleep(std::time::Duration::from_millis(10)) => Ok(()),
///     }
/// });
/// ```
#[derive(Debug)]
pub struct HookFn<F> {
    f: F,
}

impl<F> HookFn<F> {
    /// Creates a new function-backed hook.
    pub fn new<Fut>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self { f }
    }

    /// Creates the hook and returns it as a shared handle.
    pub fn arc<Fut>(f: F) -> Arc<Self>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Hook for HookFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn process(&self, ctx: CancellationToken) -> BoxTaskFuture {
        Box::pin((self.f)(ctx))
    }
}

/// A registered hook: id, display tag and the cleanup itself.
#[derive(Clone)]
pub struct ShutdownHook {
    id: HookId,
    tag: Arc<str>,
    process: HookRef,
}

impl ShutdownHook {
    /// Creates an entry with a fresh id.
    ///
    /// An empty `tag` is replaced by the id's string form.
    pub fn new(process: HookRef, tag: Option<String>) -> Self {
        let id = HookId::new();
        let tag = match tag {
            Some(t) if !t.is_empty() => t,
            _ => id.to_string(),
        };
        Self {
            id,
            tag: tag.into(),
            process,
        }
    }

    /// Returns the hook id.
    pub fn id(&self) -> HookId {
        self.id
    }

    /// Returns the display tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub(crate) fn tag_arc(&self) -> Arc<str> {
        Arc::clone(&self.tag)
    }

    /// Returns the cleanup handle.
    pub fn process(&self) -> &HookRef {
        &self.process
    }
}

impl std::fmt::Debug for ShutdownHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHook")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}
