//! # Orchestrator: background tasks, termination and graceful shutdown.
//!
//! The [`Orchestrator`] owns the configuration, the hook registry, the task
//! group and the termination watcher. Tasks and hooks can be registered at
//! any time before [`wait`](Orchestrator::wait) completes.
//!
//! ## High-level architecture
//! ```text
//! register_task*(…)  ──► TaskGroup ──► tracker.spawn(task)      (failure ─► lifetime.cancel)
//! register_shutdown_hook*(…) ──► HookRegistry (mutex, append-only)
//!
//! TerminationWatcher: source.recv() ──► lifetime.cancel(reason)
//!
//! wait():
//!   ├─► spawn unit: lifetime.cancelled()
//!   │                 └─► publish ShutdownRequested
//!   │                 └─► snapshot hooks ─► run_shutdown(snapshot, cfg)  (if any)
//!   ├─► TaskGroup::wait() ─► first failure among tasks and the unit
//!   ├─► SubscriberSet::close()  (drain pending events)
//!   └─► release watcher (drop guard, every exit path)
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use gracevisor::{Orchestrator, TaskError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::new();
//!     orch.set_max_shutdown_time(Duration::from_secs(5));
//!
//!     orch.register_task_with_token("ticker", |ctx: CancellationToken| async move {
//!         while !ctx.is_cancelled() {
//!             tokio::time::sleep(Duration::from_millis(250)).await;
//!         }
//!         Ok::<_, TaskError>(())
//!     });
//!
//!     orch.on_shutdown("flush", |_ctx: CancellationToken| async move {
//!         // flush buffers...
//!         Ok::<_, TaskError>(())
//!     });
//!
//!     // Blocks until SIGINT/SIGTERM/SIGHUP or a task failure, then runs hooks.
//!     orch.wait().await?;
//!     Ok(())
//! }
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{RuntimeError, TaskError};
use crate::events::{Event, EventKind};
use crate::hooks::{HookFn, HookId, HookRef, HookRegistry};
use crate::signals::TerminationSource;
use crate::subscribers::SubscriberSet;
use crate::tasks::{PlainFn, TaskFn, TaskRef};

use super::builder::OrchestratorBuilder;
use super::coordinator::run_shutdown;
use super::group::TaskGroup;
use super::lifetime::Lifetime;
use super::watcher::TerminationWatcher;

/// How long `wait` lets subscribers drain queued events before returning.
const EVENT_DRAIN_LIMIT: Duration = Duration::from_millis(250);

/// Process-lifetime orchestrator.
///
/// Created once, inside a Tokio runtime. Registration methods and setters take
/// `&self`, so the orchestrator can be shared (e.g. in an `Arc`) while
/// [`wait`](Self::wait) is pending.
pub struct Orchestrator {
    cfg: Arc<Mutex<Config>>,
    hooks: Arc<HookRegistry>,
    group: TaskGroup,
    lifetime: Lifetime,
    watcher: TerminationWatcher,
    subs: Arc<SubscriberSet>,
    waited: AtomicBool,
}

impl Orchestrator {
    /// Creates an orchestrator listening for the default OS signals.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new() -> Self {
        OrchestratorBuilder::new().build()
    }

    /// Returns a builder for custom signals, sources, subscribers and config.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub(crate) fn new_internal(
        cfg: Config,
        source: Option<Box<dyn TerminationSource>>,
        subs: Arc<SubscriberSet>,
    ) -> Self {
        let lifetime = Lifetime::new();
        Self {
            cfg: Arc::new(Mutex::new(cfg)),
            hooks: Arc::new(HookRegistry::new()),
            group: TaskGroup::new(lifetime.clone(), Arc::clone(&subs)),
            watcher: TerminationWatcher::spawn(source, lifetime.clone()),
            lifetime,
            subs,
            waited: AtomicBool::new(false),
        }
    }

    // ---- Background tasks ----

    /// Schedules a background task immediately. `None` is ignored.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn register(&self, task: impl Into<Option<TaskRef>>) {
        if let Some(task) = task.into() {
            self.group.spawn(task);
        }
    }

    /// Schedules a plain background task that never sees the shared token.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn register_task<F, Fut>(&self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.group.spawn(PlainFn::arc(name, f));
    }

    /// Schedules a background task receiving the shared cancellation token.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn register_task_with_token<F, Fut>(&self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.group.spawn(TaskFn::arc(name, f));
    }

    // ---- Shutdown hooks ----

    /// Registers a shutdown hook tagged with its own id.
    ///
    /// `None` is ignored and yields [`HookId::nil`].
    pub fn register_shutdown_hook(&self, hook: impl Into<Option<HookRef>>) -> HookId {
        match hook.into() {
            Some(hook) => self.hooks.register(hook, None),
            None => HookId::nil(),
        }
    }

    /// Registers a shutdown hook with a display tag.
    ///
    /// An empty tag falls back to the hook id. `None` is ignored and yields
    /// [`HookId::nil`].
    pub fn register_shutdown_hook_with_tag(
        &self,
        hook: impl Into<Option<HookRef>>,
        tag: impl Into<String>,
    ) -> HookId {
        match hook.into() {
            Some(hook) => self.hooks.register(hook, Some(tag.into())),
            None => HookId::nil(),
        }
    }

    /// Registers a closure as a tagged shutdown hook.
    pub fn on_shutdown<F, Fut>(&self, tag: impl Into<String>, f: F) -> HookId
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.hooks.register(HookFn::arc(f), Some(tag.into()))
    }

    /// Number of registered shutdown hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    // ---- Configuration ----

    /// Enables or disables promotion of hook failures to the `wait` result.
    pub fn set_cancel_on_error(&self, value: bool) {
        self.config_mut().cancel_on_error = value;
    }

    /// Sets the shutdown deadline; `Duration::ZERO` restores the default.
    pub fn set_max_shutdown_time(&self, duration: Duration) {
        self.config_mut().set_max_shutdown_time(duration);
    }

    /// Sets how many hooks may run at once; `0` restores the default.
    pub fn set_max_shutdown_process(&self, max: usize) {
        self.config_mut().set_max_concurrent_shutdown(max);
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> Config {
        self.config_mut().clone()
    }

    fn config_mut(&self) -> MutexGuard<'_, Config> {
        self.cfg.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- Lifecycle ----

    /// Clone of the shared cancellation token handed to context-aware tasks.
    pub fn token(&self) -> CancellationToken {
        self.lifetime.token().clone()
    }

    /// Requests termination as if a signal had arrived. Idempotent.
    pub fn request_shutdown(&self) {
        self.lifetime.cancel("shutdown requested");
    }

    /// Blocks until termination is requested, runs the shutdown hooks and
    /// waits for every background task.
    ///
    /// Returns the first failure observed among background tasks and the
    /// shutdown sequence. Hook failures surface only with `cancel_on_error`;
    /// a missed deadline always does. The termination watcher is released on
    /// every exit path, including when this future is dropped.
    ///
    /// Subscribers get a short fixed grace period to drain queued events;
    /// a slow subscriber never extends the shutdown deadline by more.
    ///
    /// Calling `wait` a second time returns [`RuntimeError::AlreadyWaited`].
    pub async fn wait(&self) -> Result<(), RuntimeError> {
        if self.waited.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyWaited);
        }
        let _release = self.watcher.release_guard();

        let lifetime = self.lifetime.clone();
        let hooks = Arc::clone(&self.hooks);
        let cfg = Arc::clone(&self.cfg);
        let subs = Arc::clone(&self.subs);
        self.group.spawn_unit("shutdown", async move {
            lifetime.token().cancelled().await;

            let reason = lifetime.cause().unwrap_or_else(|| "token cancelled".into());
            subs.emit(Event::new(EventKind::ShutdownRequested).with_reason(reason));

            let snapshot = hooks.snapshot();
            if snapshot.is_empty() {
                return Ok(());
            }
            let cfg = cfg.lock().unwrap_or_else(PoisonError::into_inner).clone();
            run_shutdown(snapshot, &cfg, subs).await
        });

        let res = self.group.wait().await;
        self.subs.close(EVENT_DRAIN_LIMIT).await;
        res
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
