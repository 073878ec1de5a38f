//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → tracing::error!, worker continues
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Overflow**: event dropped for that subscriber only (warn)
//! - **Isolation**: slow/panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//! - **Close**: [`close`](SubscriberSet::close) stops accepting events and
//!   drains the queues; later emits are dropped silently

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    channels: Mutex<Vec<SubscriberChannel>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        tracing::error!(
                            subscriber = sub.name(),
                            info = %panic_message(panic_err.as_ref()),
                            "subscriber panicked"
                        );
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels: Mutex::new(channels),
            workers: Mutex::new(workers),
        }
    }

    /// Emits an event to all subscribers without waiting for them.
    pub fn emit(&self, event: Event) {
        let event = Arc::new(event);
        for channel in lock(&self.channels).iter() {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = channel.name, "subscriber queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = channel.name, "subscriber closed, event dropped");
                }
            }
        }
    }

    /// Closes every queue and waits up to `limit` for workers to drain them.
    ///
    /// Idempotent; workers still busy after `limit` are left running.
    pub async fn close(&self, limit: Duration) {
        drop(std::mem::take(&mut *lock(&self.channels)));
        let workers = std::mem::take(&mut *lock(&self.workers));

        let drain = async {
            for h in workers {
                let _ = h.await;
            }
        };
        if tokio::time::timeout(limit, drain).await.is_err() {
            tracing::warn!(limit = ?limit, "subscribers did not drain in time");
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::events::EventKind;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _event: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber bug");
        }
    }

    #[tokio::test]
    async fn test_close_drains_pending_events() {
        let counter = Arc::new(Counter::default());
        let set = SubscriberSet::new(vec![
            counter.clone() as Arc<dyn Subscribe>,
            Arc::new(Panicky) as Arc<dyn Subscribe>,
        ]);

        for _ in 0..10 {
            set.emit(Event::new(EventKind::TaskStopped));
        }
        set.close(Duration::from_secs(1)).await;

        assert_eq!(counter.0.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_emit_after_close_is_dropped() {
        let counter = Arc::new(Counter::default());
        let set = SubscriberSet::new(vec![counter.clone() as Arc<dyn Subscribe>]);
        set.close(Duration::from_secs(1)).await;

        set.emit(Event::new(EventKind::TaskStopped));
        set.close(Duration::from_secs(1)).await;

        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }
}
