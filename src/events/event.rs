//! # Runtime events emitted by the orchestrator.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Termination events**: a shutdown was requested
//! - **Task events**: background task completion and failure
//! - **Hook events**: per-hook outcome plus the final shutdown verdict
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Subscribers see their own events in order; use `seq` to merge across subscribers.
//!
//! ## Example
//! ```rust
//! use gracevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HookFailed)
//!     .with_name("db-pool")
//!     .with_reason("connection reset");
//!
//! assert_eq!(ev.kind, EventKind::HookFailed);
//! assert_eq!(ev.name.as_deref(), Some("db-pool"));
//! assert!(ev.is_hook_outcome());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::hooks::HookId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Termination ===
    /// The shared cancellation fired (OS signal, manual trigger or task failure).
    ///
    /// Sets:
    /// - `reason`: what requested termination, when known
    ShutdownRequested,

    // === Background tasks ===
    /// A background task finished successfully.
    ///
    /// Sets:
    /// - `name`: task name
    TaskStopped,

    /// A background task failed or panicked.
    ///
    /// Sets:
    /// - `name`: task name
    /// - `reason`: error message
    TaskFailed,

    // === Shutdown hooks ===
    /// A hook was admitted and started.
    ///
    /// Sets:
    /// - `name`: hook tag
    /// - `hook`: hook id
    HookStarting,

    /// A hook returned `Ok(())`.
    ///
    /// Sets:
    /// - `name`: hook tag
    /// - `hook`: hook id
    /// - `elapsed_ms`: time since the hook started
    HookSucceeded,

    /// A hook returned an error (or panicked).
    ///
    /// Sets:
    /// - `name`: hook tag
    /// - `hook`: hook id
    /// - `reason`: error message
    /// - `elapsed_ms`: time since the hook started
    HookFailed,

    /// The deadline fired before the hook returned; its wait was abandoned.
    ///
    /// Sets:
    /// - `name`: hook tag
    /// - `hook`: hook id
    /// - `timeout_ms`: configured `max_shutdown_time`
    HookTimedOut,

    /// Another hook's failure cancelled the shutdown before this hook returned.
    ///
    /// Sets:
    /// - `name`: hook tag
    /// - `hook`: hook id
    HookAbandoned,

    /// Every hook was observed before the deadline.
    ///
    /// Sets:
    /// - `elapsed_ms`: total shutdown duration
    ShutdownCompleted,

    /// The deadline elapsed with hooks still pending.
    ///
    /// Sets:
    /// - `timeout_ms`: configured `max_shutdown_time`
    /// - `reason`: pending hook tags
    DeadlineExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Task name or hook tag, if applicable.
    pub name: Option<Arc<str>>,
    /// Hook id, for hook events.
    pub hook: Option<HookId>,
    /// Human-readable reason (errors, pending hooks, signal name).
    pub reason: Option<Arc<str>>,
    /// Deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Elapsed time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            name: None,
            hook: None,
            reason: None,
            timeout_ms: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a task name or hook tag.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a hook id.
    #[inline]
    pub fn with_hook(mut self, id: HookId) -> Self {
        self.hook = Some(id);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a deadline (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(millis(d));
        self
    }

    /// Returns `true` for the terminal per-hook events.
    #[inline]
    pub fn is_hook_outcome(&self) -> bool {
        matches!(
            self.kind,
            EventKind::HookSucceeded
                | EventKind::HookFailed
                | EventKind::HookTimedOut
                | EventKind::HookAbandoned
        )
    }
}

fn millis(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::TaskStopped);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_durations_saturate() {
        let ev = Event::new(EventKind::DeadlineExceeded).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
