//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`Orchestrator`] and its
//! [`OrchestratorBuilder`].
//!
//! Internal modules:
//! - [`lifetime`]: shared cancellation token plus first recorded cause;
//! - [`watcher`]: turns termination requests into the shared cancellation;
//! - [`group`]: supervises background tasks, first failure cancels everything;
//! - [`coordinator`]: runs shutdown hooks under a deadline and a concurrency cap;
//! - [`orchestrator`]: facade wiring the above together.

mod builder;
mod coordinator;
mod group;
mod lifetime;
mod orchestrator;
mod watcher;

pub use builder::OrchestratorBuilder;
pub use orchestrator::Orchestrator;
