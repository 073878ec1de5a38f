//! # LogWriter: tracing-backed event logger
//!
//! Renders every [`Event`] as a structured `tracing` record. Installed by
//! default on every orchestrator; replace it through
//! [`OrchestratorBuilder::with_subscribers`](crate::OrchestratorBuilder::with_subscribers).
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  gracevisor: shutdown requested reason="SIGTERM"
//! ERROR gracevisor: task failed task="server" err="bind: address in use"
//! INFO  gracevisor: shutdown success tag="http-server" elapsed_ms=12
//! ERROR gracevisor: shutdown failed tag="cache" err="execution failed: flush"
//! WARN  gracevisor: shutdown timed out tag="queue" timeout_ms=10000
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let name = e.name.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ShutdownRequested => {
                tracing::info!(target: "gracevisor", reason, "shutdown requested");
            }
            EventKind::TaskStopped => {
                tracing::debug!(target: "gracevisor", task = name, "task stopped");
            }
            EventKind::TaskFailed => {
                tracing::error!(target: "gracevisor", task = name, err = reason, "task failed");
            }
            EventKind::HookStarting => {
                tracing::debug!(target: "gracevisor", tag = name, "shutdown starting");
            }
            EventKind::HookSucceeded => {
                tracing::info!(target: "gracevisor", tag = name, elapsed_ms = e.elapsed_ms, "shutdown success");
            }
            EventKind::HookFailed => {
                tracing::error!(target: "gracevisor", tag = name, err = reason, "shutdown failed");
            }
            EventKind::HookTimedOut => {
                tracing::warn!(target: "gracevisor", tag = name, timeout_ms = e.timeout_ms, "shutdown timed out");
            }
            EventKind::HookAbandoned => {
                tracing::warn!(target: "gracevisor", tag = name, "shutdown abandoned");
            }
            EventKind::ShutdownCompleted => {
                tracing::info!(target: "gracevisor", elapsed_ms = e.elapsed_ms, "all shutdown hooks finished");
            }
            EventKind::DeadlineExceeded => {
                tracing::warn!(target: "gracevisor", timeout_ms = e.timeout_ms, pending = reason, "shutdown deadline exceeded");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
