//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! coordinator / task group ── emit(Event) ──► SubscriberSet
//!                                                │
//!                                   ┌────────────┼────────────┐
//!                                   ▼            ▼            ▼
//!                               [queue 1]    [queue 2]    [queue N]
//!                                   │            │            │
//!                               LogWriter     Metrics      Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use gracevisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Subscribe for Alerts {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::HookFailed {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "alerts" }
//! }
//! ```

mod log;
mod subscribe;
mod subscriber_set;

pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;

pub(crate) use subscriber_set::panic_message;
