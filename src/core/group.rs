//! # Task group: supervised background tasks sharing one cancellation.
//!
//! Every task runs as its own Tokio task, tracked by a [`TaskTracker`]. The
//! first failure (error or panic) is recorded and cancels the shared
//! [`Lifetime`] immediately; other tasks are never aborted and are expected to
//! observe the token or finish naturally.
//!
//! ## Flow
//! ```text
//! spawn(task) ──► tracker.spawn(unit)
//!                    ├─ Ok(())   ─► publish TaskStopped
//!                    ├─ Err(e)   ─► publish TaskFailed ─► record first ─► lifetime.cancel()
//!                    └─ panic    ─► publish TaskFailed ─► record first ─► lifetime.cancel()
//!
//! spawn_unit(name, fut) ──► tracker.spawn(unit)   (error or panic ─► record first)
//!
//! wait() ──► tracker.close() ──► tracker.wait() ──► first recorded failure | Ok
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tokio_util::task::TaskTracker;

use crate::core::lifetime::Lifetime;
use crate::error::{RuntimeError, TaskError};
use crate::events::{Event, EventKind};
use crate::subscribers::{SubscriberSet, panic_message};
use crate::tasks::TaskRef;

pub(crate) struct TaskGroup {
    tracker: TaskTracker,
    shared: Arc<Shared>,
}

struct Shared {
    lifetime: Lifetime,
    first_err: OnceLock<RuntimeError>,
    subs: Arc<SubscriberSet>,
}

impl Shared {
    /// Records `err` if it is the first failure and cancels the lifetime.
    fn fail(&self, err: RuntimeError) {
        let cause = err.to_string();
        let _ = self.first_err.set(err);
        self.lifetime.cancel(cause);
    }
}

impl TaskGroup {
    pub(crate) fn new(lifetime: Lifetime, subs: Arc<SubscriberSet>) -> Self {
        Self {
            tracker: TaskTracker::new(),
            shared: Arc::new(Shared {
                lifetime,
                first_err: OnceLock::new(),
                subs,
            }),
        }
    }

    /// Schedules a background task; the task receives the shared token.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(&self, task: TaskRef) {
        let shared = Arc::clone(&self.shared);
        let ctx = shared.lifetime.token().clone();

        self.tracker.spawn(async move {
            let name = task.name().to_string();
            let res = AssertUnwindSafe(async { task.spawn(ctx).await })
                .catch_unwind()
                .await;

            let err = match res {
                Ok(Ok(())) => {
                    shared.subs.emit(Event::new(EventKind::TaskStopped).with_name(name));
                    return;
                }
                Ok(Err(source)) => RuntimeError::TaskFailed {
                    task: name.clone(),
                    source,
                },
                Err(panic) => RuntimeError::TaskPanicked {
                    task: name.clone(),
                    info: panic_message(panic.as_ref()),
                },
            };
            shared.subs.emit(
                Event::new(EventKind::TaskFailed)
                    .with_name(name)
                    .with_reason(err.as_message()),
            );
            shared.fail(err);
        });
    }

    /// Schedules an internal unit whose failure counts like a task failure
    /// but is not published as a task event. A panic is reported as
    /// [`RuntimeError::TaskPanicked`] under `name`.
    pub(crate) fn spawn_unit<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = Result<(), RuntimeError>> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        self.tracker.spawn(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => shared.fail(err),
                Err(panic) => {
                    let info = panic_message(panic.as_ref());
                    tracing::error!(unit = name, %info, "internal unit panicked");
                    shared.fail(RuntimeError::TaskPanicked {
                        task: name.to_string(),
                        info,
                    });
                }
            }
        });
    }

    /// Waits for every scheduled unit and returns the first failure.
    pub(crate) async fn wait(&self) -> Result<(), RuntimeError> {
        self.tracker.close();
        self.tracker.wait().await;
        match self.shared.first_err.get() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::tasks::{PlainFn, TaskFn};

    fn group() -> (TaskGroup, Lifetime) {
        let lifetime = Lifetime::new();
        let subs = Arc::new(SubscriberSet::new(Vec::new()));
        (TaskGroup::new(lifetime.clone(), subs), lifetime)
    }

    #[tokio::test]
    async fn test_empty_group_succeeds() {
        let (group, lifetime) = group();
        assert!(group.wait().await.is_ok());
        assert!(!lifetime.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_first_failure_cancels_and_is_returned() {
        let (group, lifetime) = group();

        group.spawn(PlainFn::arc("broken", || async { Err(TaskError::fail("boom")) }));
        group.spawn(TaskFn::arc("cooperative", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Ok(())
        }));

        let res = tokio::time::timeout(Duration::from_secs(2), group.wait())
            .await
            .unwrap();
        assert_eq!(
            res,
            Err(RuntimeError::TaskFailed {
                task: "broken".into(),
                source: TaskError::fail("boom"),
            })
        );
        assert!(lifetime.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_panic_is_captured_as_failure() {
        let (group, lifetime) = group();
        group.spawn(PlainFn::arc("explodes", || async {
            if true {
                panic!("kaboom");
            }
            Ok(())
        }));

        let res = group.wait().await;
        assert!(matches!(
            res,
            Err(RuntimeError::TaskPanicked { ref task, ref info }) if task == "explodes" && info == "kaboom"
        ));
        assert!(lifetime.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_unit_failure_counts() {
        let (group, _lifetime) = group();
        group.spawn_unit("unit", async { Err(RuntimeError::AlreadyWaited) });
        assert_eq!(group.wait().await, Err(RuntimeError::AlreadyWaited));
    }

    #[tokio::test]
    async fn test_unit_panic_is_captured_as_failure() {
        let (group, lifetime) = group();
        group.spawn_unit("shutdown", async {
            if true {
                panic!("unit bug");
            }
            Ok(())
        });

        assert_eq!(
            group.wait().await,
            Err(RuntimeError::TaskPanicked {
                task: "shutdown".into(),
                info: "unit bug".into(),
            })
        );
        assert!(lifetime.token().is_cancelled());
    }
}
