//! Runtime events.
//!
//! [`EventKind`] and [`Event`] describe what happened during the process
//! lifetime: termination requests, background task failures and the outcome
//! of every shutdown hook. Events are delivered to subscribers through
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Quick reference
//! - **Publishers**: task group units, the shutdown coordinator, the orchestrator.
//! - **Consumers**: [`Subscribe`](crate::Subscribe) implementations, e.g. [`LogWriter`](crate::LogWriter).

mod event;

pub use event::{Event, EventKind};
