//! # Shutdown hooks.
//!
//! - [`Hook`] - trait for cleanup work executed once termination is requested
//! - [`HookFn`] - function-backed hook
//! - [`HookRef`] - shared reference to a hook (`Arc<dyn Hook>`)
//! - [`HookId`] - opaque unique id assigned at registration
//! - [`ShutdownHook`] - registered `{id, tag, process}` entry

mod hook;
mod id;
mod registry;

pub use hook::{Hook, HookFn, HookRef, ShutdownHook};
pub use id::HookId;

pub(crate) use registry::HookRegistry;
