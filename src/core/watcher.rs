//! # Termination watcher.
//!
//! Spawns a listener that waits on a [`TerminationSource`] and cancels the
//! shared [`Lifetime`] on the first request. The listener keeps consuming
//! requests until released, so repeated signals during shutdown are absorbed
//! instead of reaching the process.
//!
//! ## Release
//! [`release_guard`](TerminationWatcher::release_guard) returns a guard that
//! stops the listener when dropped; the watcher also releases itself on drop.
//! On release the source is handed back through
//! [`TerminationSource::release`], so a later request gets the platform's
//! default handling again.

use tokio_util::sync::{CancellationToken, DropGuard};

use crate::core::lifetime::Lifetime;
use crate::signals::TerminationSource;

pub(crate) struct TerminationWatcher {
    release: CancellationToken,
}

impl TerminationWatcher {
    /// Starts watching `source`. With `None`, only task failures and explicit
    /// requests cancel the lifetime.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(source: Option<Box<dyn TerminationSource>>, lifetime: Lifetime) -> Self {
        let release = CancellationToken::new();
        if let Some(source) = source {
            tokio::spawn(listen(source, lifetime, release.clone()));
        }
        Self { release }
    }

    /// Guard releasing the watcher when dropped.
    pub(crate) fn release_guard(&self) -> DropGuard {
        self.release.clone().drop_guard()
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        self.release.is_cancelled()
    }
}

impl Drop for TerminationWatcher {
    fn drop(&mut self) {
        self.release.cancel();
    }
}

async fn listen(
    mut source: Box<dyn TerminationSource>,
    lifetime: Lifetime,
    release: CancellationToken,
) {
    loop {
        let req = tokio::select! {
            biased;
            _ = release.cancelled() => break,
            req = source.recv() => req,
        };
        match req {
            Some(reason) if lifetime.token().is_cancelled() => {
                tracing::warn!(%reason, "termination already in progress");
            }
            Some(reason) => {
                tracing::info!(%reason, "termination requested");
                lifetime.cancel(reason);
            }
            None => {
                tracing::debug!("termination source closed");
                return;
            }
        }
    }
    tracing::debug!("termination watcher released");
    source.release();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::signals::Trigger;

    #[tokio::test]
    async fn test_trigger_cancels_lifetime() {
        let lifetime = Lifetime::new();
        let trigger = Trigger::new();
        let source: Box<dyn TerminationSource> = Box::new(trigger.clone());
        let _watcher = TerminationWatcher::spawn(Some(source), lifetime.clone());

        trigger.fire();
        tokio::time::timeout(Duration::from_secs(1), lifetime.token().cancelled())
            .await
            .unwrap();
        assert_eq!(lifetime.cause().as_deref(), Some("manual trigger"));
    }

    /// Source that never fires and records its release.
    struct Pending(Arc<AtomicBool>);

    #[async_trait]
    impl TerminationSource for Pending {
        async fn recv(&mut self) -> Option<String> {
            std::future::pending().await
        }

        fn release(self: Box<Self>) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_release_hands_source_back() {
        let released = Arc::new(AtomicBool::new(false));
        let source: Box<dyn TerminationSource> = Box::new(Pending(released.clone()));
        let watcher = TerminationWatcher::spawn(Some(source), Lifetime::new());

        drop(watcher.release_guard());
        tokio::time::timeout(Duration::from_secs(1), async {
            while !released.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_watcher_hands_source_back() {
        let released = Arc::new(AtomicBool::new(false));
        let source: Box<dyn TerminationSource> = Box::new(Pending(released.clone()));
        drop(TerminationWatcher::spawn(Some(source), Lifetime::new()));

        tokio::time::timeout(Duration::from_secs(1), async {
            while !released.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_released_watcher_ignores_requests() {
        let lifetime = Lifetime::new();
        let trigger = Trigger::new();
        let source: Box<dyn TerminationSource> = Box::new(trigger.clone());
        let watcher = TerminationWatcher::spawn(Some(source), lifetime.clone());

        drop(watcher.release_guard());
        assert!(watcher.is_released());
        tokio::time::sleep(Duration::from_millis(20)).await;

        trigger.fire();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!lifetime.token().is_cancelled());
    }
}
