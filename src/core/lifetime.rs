//! # Shared process-lifetime cancellation.
//!
//! [`Lifetime`] pairs the orchestrator-wide [`CancellationToken`] with the
//! first recorded cause. Whoever cancels first (watcher, failing task,
//! explicit request) names the cause; later cancels are no-ops.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
pub(crate) struct Lifetime {
    token: CancellationToken,
    cause: Arc<OnceLock<Arc<str>>>,
}

impl Lifetime {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Cancels the lifetime, recording `cause` if it is the first one.
    pub(crate) fn cancel(&self, cause: impl Into<Arc<str>>) {
        let _ = self.cause.set(cause.into());
        self.token.cancel();
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// First recorded cause; `None` when the token was cancelled directly.
    pub(crate) fn cause(&self) -> Option<Arc<str>> {
        self.cause.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_cause_wins() {
        let lt = Lifetime::new();
        lt.cancel("SIGTERM");
        lt.cancel("task failed");

        assert!(lt.token().is_cancelled());
        assert_eq!(lt.cause().as_deref(), Some("SIGTERM"));
    }

    #[test]
    fn test_direct_cancel_has_no_cause() {
        let lt = Lifetime::new();
        lt.token().cancel();
        assert!(lt.cause().is_none());
    }
}
