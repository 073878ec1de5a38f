//! # gracevisor
//!
//! **Gracevisor** is a process-lifetime orchestrator for Tokio applications.
//!
//! It runs long-lived background tasks, watches for a termination request
//! (an OS signal or a failing task) and then drives an orderly shutdown:
//! registered cleanup hooks run concurrently, under a deadline and a
//! concurrency cap, and their outcomes collapse into a single result.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌────────────┐  ┌────────────┐        ┌────────────┐  ┌────────────┐
//!  │   Task #1  │  │   Task #2  │        │  Hook "db" │  │ Hook "http"│
//!  └─────┬──────┘  └─────┬──────┘        └─────┬──────┘  └─────┬──────┘
//!        ▼               ▼                     ▼               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - TaskGroup          (tasks, first failure cancels the lifetime) │
//! │  - HookRegistry       (append-only, mutex-guarded)                │
//! │  - TerminationWatcher (OS signals / Trigger ─► cancel lifetime)   │
//! │  - SubscriberSet      (event fan-out, LogWriter by default)       │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼  lifetime cancelled
//!                    ┌─────────────────────────┐
//!                    │   ShutdownCoordinator   │
//!                    │  semaphore (max N)      │
//!                    │  deadline token         │
//!                    │  cancel_on_error policy │
//!                    └────────────┬────────────┘
//!                                 ▼
//!                  wait() ─► Ok | first failure
//! ```
//!
//! ### Lifecycle
//! ```text
//! Orchestrator::new()  ──► watcher starts listening
//! register_task*(…)    ──► task spawned immediately
//! on_shutdown(…)       ──► hook appended to registry
//! wait():
//!   ├─► block until lifetime cancelled (signal, request_shutdown, task failure)
//!   ├─► publish ShutdownRequested
//!   ├─► run hooks (≤ max_concurrent_shutdown at once, ≤ max_shutdown_time total)
//!   │       ├─ Ok         ─► HookSucceeded
//!   │       ├─ Err        ─► HookFailed  (cancel_on_error ─► result + cancel rest)
//!   │       └─ deadline   ─► HookTimedOut (wait abandoned, hook not aborted)
//!   ├─► await every background task
//!   └─► release watcher, return first failure
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Orchestration** | Register tasks and hooks, block until shutdown completes.     | [`Orchestrator`], [`OrchestratorBuilder`]|
//! | **Tasks**         | Plain or token-aware background tasks.                        | [`Task`], [`TaskFn`], [`PlainFn`]        |
//! | **Hooks**         | Cleanup functions with id and tag.                            | [`Hook`], [`HookFn`], [`HookId`]         |
//! | **Termination**   | OS signals or programmatic triggers.                          | [`TerminationSource`], [`OsSignals`], [`Trigger`] |
//! | **Subscriber API**| Observe task failures and per-hook outcomes.                  | [`Subscribe`], [`Event`], [`LogWriter`]  |
//! | **Errors**        | Typed errors for tasks, hooks and the runtime.                | [`TaskError`], [`RuntimeError`]          |
//! | **Configuration** | Deadline, concurrency cap, error policy.                      | [`Config`]                               |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use gracevisor::{Orchestrator, TaskError, Trigger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let trigger = Trigger::new();
//!     let orch = Orchestrator::builder().with_source(trigger.clone()).build();
//!     orch.set_max_shutdown_time(Duration::from_secs(2));
//!
//!     orch.register_task_with_token("worker", |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, TaskError>(())
//!     });
//!     orch.on_shutdown("close-db", |_ctx: CancellationToken| async {
//!         Ok::<_, TaskError>(())
//!     });
//!
//!     trigger.fire();
//!     orch.wait().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod hooks;
mod signals;
mod subscribers;
mod tasks;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_MAX_CONCURRENT_SHUTDOWN, DEFAULT_MAX_SHUTDOWN_TIME};
pub use crate::core::{Orchestrator, OrchestratorBuilder};
pub use error::{RuntimeError, TaskError};
pub use events::{Event, EventKind};
pub use hooks::{Hook, HookFn, HookId, HookRef, ShutdownHook};
pub use signals::{DEFAULT_SIGNALS, OsSignals, Signal, TerminationSource, Trigger};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, PlainFn, Task, TaskFn, TaskRef};
