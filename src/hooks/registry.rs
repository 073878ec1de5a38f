//! # Hook registry.
//!
//! Append-only list of [`ShutdownHook`]s guarded by a mutex. The coordinator
//! takes one [`snapshot`](HookRegistry::snapshot) when shutdown begins; hooks
//! appended afterwards are not part of that run.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::hooks::{HookId, HookRef, ShutdownHook};

#[derive(Default)]
pub(crate) struct HookRegistry {
    hooks: Mutex<Vec<ShutdownHook>>,
}

impl HookRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a hook and returns its id.
    pub(crate) fn register(&self, process: HookRef, tag: Option<String>) -> HookId {
        let hook = ShutdownHook::new(process, tag);
        let id = hook.id();
        self.lock().push(hook);
        id
    }

    /// Copies the current hooks in registration order.
    pub(crate) fn snapshot(&self) -> Vec<ShutdownHook> {
        self.lock().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ShutdownHook>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::TaskError;
    use crate::hooks::HookFn;

    fn noop() -> HookRef {
        HookFn::arc(|_ctx: CancellationToken| async { Ok::<_, TaskError>(()) })
    }

    #[test]
    fn test_snapshot_keeps_registration_order() {
        let reg = HookRegistry::new();
        reg.register(noop(), Some("a".into()));
        reg.register(noop(), Some("b".into()));
        reg.register(noop(), Some("c".into()));

        let tags: Vec<_> = reg.snapshot().iter().map(|h| h.tag().to_string()).collect();
        assert_eq!(tags, ["a", "b", "c"]);
    }

    #[test]
    fn test_concurrent_registration_yields_unique_ids() {
        let reg = Arc::new(HookRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| reg.register(noop(), None))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for h in handles {
            ids.extend(h.join().unwrap());
        }
        assert_eq!(ids.len(), 400);
        assert_eq!(reg.len(), 400);
    }
}
