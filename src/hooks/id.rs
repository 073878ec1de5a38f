use std::fmt;

use uuid::Uuid;

/// Opaque identifier of a registered shutdown hook.
///
/// Ids are random (UUID v4) and unique within one orchestrator. The nil id is
/// returned for ignored registrations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(Uuid);

impl HookId {
    /// Generates a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The empty id (all zeros).
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `true` for the id handed out by ignored registrations.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HookId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
