//! # Shutdown coordinator: bounded, deadline-limited hook execution.
//!
//! Runs a snapshot of [`ShutdownHook`]s with at most
//! [`Config::max_concurrent_shutdown`] in flight, waits at most
//! [`Config::max_shutdown_time`] overall and applies the
//! [`Config::cancel_on_error`] policy.
//!
//! ## Flow
//! ```text
//! run_shutdown(hooks, cfg)
//!   ├─► expired = token fired at now + max_shutdown_time
//!   ├─► cancel  = expired.child_token()          (also fired by first failure)
//!   ├─► for hook in hooks (registration order):
//!   │       acquire permit ─► spawn unit(hook, permit)
//!   │
//!   │   unit:
//!   │     spawn hook.process(cancel) as its own task
//!   │     select (biased):
//!   │       ├─ hook returned Ok   ─► publish HookSucceeded
//!   │       ├─ hook returned Err  ─► publish HookFailed
//!   │       │                        └─ cancel_on_error ─► record first, cancel.cancel()
//!   │       └─ cancel fired       ─► expired? publish HookTimedOut : HookAbandoned
//!   │     drop permit
//!   │
//!   └─► join all units ─► first recorded failure
//!                        | DeadlineExceeded { pending }
//!                        | Ok (publish ShutdownCompleted)
//! ```
//!
//! ## Rules
//! - Abandoning a hook never aborts it: its task keeps running unobserved and
//!   only its result is ignored. Hooks should watch their token.
//! - Every hook is attempted once, even after the deadline or a failure has
//!   cancelled the run; such late hooks start with a cancelled token.
//! - Permits are held by the waiting unit, so an abandoned hook frees its slot.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{RuntimeError, TaskError};
use crate::events::{Event, EventKind};
use crate::hooks::ShutdownHook;
use crate::subscribers::{SubscriberSet, panic_message};

/// How a single hook's wait ended.
enum Outcome {
    Completed,
    TimedOut { index: usize, tag: String },
    Abandoned,
}

/// State shared by every unit of one shutdown run.
struct Run {
    expired: CancellationToken,
    cancel: CancellationToken,
    first_err: OnceLock<RuntimeError>,
    cancel_on_error: bool,
    timeout: Duration,
    subs: Arc<SubscriberSet>,
}

/// Executes `hooks` according to `cfg` and returns the aggregated outcome.
pub(crate) async fn run_shutdown(
    hooks: Vec<ShutdownHook>,
    cfg: &Config,
    subs: Arc<SubscriberSet>,
) -> Result<(), RuntimeError> {
    let started = Instant::now();
    let expired = CancellationToken::new();
    let run = Arc::new(Run {
        cancel: expired.child_token(),
        expired: expired.clone(),
        first_err: OnceLock::new(),
        cancel_on_error: cfg.cancel_on_error,
        timeout: cfg.max_shutdown_time,
        subs,
    });

    // `sleep` saturates durations past the clock range.
    let limit = cfg.max_shutdown_time;
    let timer = tokio::spawn(async move {
        tokio::time::sleep(limit).await;
        expired.cancel();
    });

    let slots = Arc::new(Semaphore::new(cfg.max_concurrent_shutdown.max(1)));
    let mut units = JoinSet::new();
    for (index, hook) in hooks.into_iter().enumerate() {
        let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
            break;
        };
        units.spawn(run_hook(index, hook, permit, Arc::clone(&run)));
    }

    let mut pending = Vec::new();
    while let Some(joined) = units.join_next().await {
        match joined {
            Ok(Outcome::TimedOut { index, tag }) => pending.push((index, tag)),
            Ok(Outcome::Completed | Outcome::Abandoned) => {}
            Err(e) => tracing::error!(error = %e, "shutdown unit crashed"),
        }
    }
    timer.abort();

    if let Some(err) = run.first_err.get() {
        return Err(err.clone());
    }
    if !pending.is_empty() {
        pending.sort_unstable_by_key(|(index, _)| *index);
        let pending: Vec<String> = pending.into_iter().map(|(_, tag)| tag).collect();
        run.subs.emit(
            Event::new(EventKind::DeadlineExceeded)
                .with_timeout(run.timeout)
                .with_reason(pending.join(", ")),
        );
        return Err(RuntimeError::DeadlineExceeded {
            timeout: run.timeout,
            pending,
        });
    }

    run.subs
        .emit(Event::new(EventKind::ShutdownCompleted).with_elapsed(started.elapsed()));
    Ok(())
}

/// Runs one hook in its own task and races it against the run's cancellation.
async fn run_hook(
    index: usize,
    hook: ShutdownHook,
    _permit: OwnedSemaphorePermit,
    run: Arc<Run>,
) -> Outcome {
    let tag = hook.tag_arc();
    let id = hook.id();
    let started = Instant::now();
    run.subs.emit(
        Event::new(EventKind::HookStarting)
            .with_name(Arc::clone(&tag))
            .with_hook(id),
    );

    let process = Arc::clone(hook.process());
    let ctx = run.cancel.clone();
    let mut handle = tokio::spawn(async move { process.process(ctx).await });

    tokio::select! {
        biased;
        joined = &mut handle => {
            let res = match joined {
                Ok(res) => res,
                Err(e) if e.is_panic() => Err(TaskError::fail(format!(
                    "panicked: {}",
                    panic_message(e.into_panic().as_ref())
                ))),
                Err(e) => Err(TaskError::fail(e)),
            };
            match res {
                Ok(()) => {
                    run.subs.emit(
                        Event::new(EventKind::HookSucceeded)
                            .with_name(tag)
                            .with_hook(id)
                            .with_elapsed(started.elapsed()),
                    );
                }
                Err(source) => {
                    run.subs.emit(
                        Event::new(EventKind::HookFailed)
                            .with_name(Arc::clone(&tag))
                            .with_hook(id)
                            .with_reason(source.to_string())
                            .with_elapsed(started.elapsed()),
                    );
                    if run.cancel_on_error {
                        let _ = run.first_err.set(RuntimeError::HookFailed {
                            tag: tag.to_string(),
                            source,
                        });
                        run.cancel.cancel();
                    }
                }
            }
            Outcome::Completed
        }
        _ = run.cancel.cancelled() => {
            if run.expired.is_cancelled() {
                run.subs.emit(
                    Event::new(EventKind::HookTimedOut)
                        .with_name(Arc::clone(&tag))
                        .with_hook(id)
                        .with_timeout(run.timeout),
                );
                Outcome::TimedOut { index, tag: tag.to_string() }
            } else {
                run.subs.emit(
                    Event::new(EventKind::HookAbandoned)
                        .with_name(tag)
                        .with_hook(id),
                );
                Outcome::Abandoned
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::hooks::{HookFn, HookRef};
    use crate::testing::Recorder;

    fn cfg(max_time: Duration, max_concurrent: usize, cancel_on_error: bool) -> Config {
        Config {
            max_shutdown_time: max_time,
            max_concurrent_shutdown: max_concurrent,
            cancel_on_error,
        }
    }

    fn hook(tag: &str, process: HookRef) -> ShutdownHook {
        ShutdownHook::new(process, Some(tag.to_string()))
    }

    fn sleeping(ms: u64) -> HookRef {
        HookFn::arc(move |_ctx: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(())
        })
    }

    fn failing(msg: &'static str) -> HookRef {
        HookFn::arc(move |_ctx: CancellationToken| async move { Err(TaskError::fail(msg)) })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failures_are_reported_but_not_propagated() {
        let (rec, subs) = Recorder::set();
        let hooks = vec![hook("A", sleeping(50)), hook("B", failing("b broke"))];

        let res = run_shutdown(hooks, &cfg(Duration::from_secs(5), 2, false), subs.clone()).await;
        subs.close(Duration::from_secs(1)).await;

        assert!(res.is_ok());
        assert_eq!(rec.outcome("A"), Some(EventKind::HookSucceeded));
        assert_eq!(rec.outcome("B"), Some(EventKind::HookFailed));
        assert!(rec.kinds().contains(&EventKind::ShutdownCompleted));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancel_on_error_propagates_first_failure() {
        let (_rec, subs) = Recorder::set();
        let hooks = vec![hook("A", sleeping(1000)), hook("B", failing("b broke"))];

        let started = Instant::now();
        let res = run_shutdown(hooks, &cfg(Duration::from_secs(5), 2, true), subs).await;

        assert_eq!(
            res,
            Err(RuntimeError::HookFailed {
                tag: "B".into(),
                source: TaskError::fail("b broke"),
            })
        );
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deadline_abandons_slow_hook() {
        let (rec, subs) = Recorder::set();
        let hooks = vec![hook("fast", sleeping(10)), hook("stuck", sleeping(10_000))];

        let limit = Duration::from_millis(200);
        let started = Instant::now();
        let res = run_shutdown(hooks, &cfg(limit, 2, false), subs.clone()).await;
        let elapsed = started.elapsed();
        subs.close(Duration::from_secs(1)).await;

        assert_eq!(
            res,
            Err(RuntimeError::DeadlineExceeded {
                timeout: limit,
                pending: vec!["stuck".into()],
            })
        );
        assert!(elapsed >= limit, "returned early: {elapsed:?}");
        assert!(elapsed < limit + Duration::from_millis(300), "returned late: {elapsed:?}");
        assert_eq!(rec.outcome("fast"), Some(EventKind::HookSucceeded));
        assert_eq!(rec.outcome("stuck"), Some(EventKind::HookTimedOut));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unbounded_deadline_still_runs_hooks() {
        let (rec, subs) = Recorder::set();
        let hooks = vec![hook("h", failing("h broke"))];

        let res = run_shutdown(hooks, &cfg(Duration::MAX, 1, true), subs.clone()).await;
        subs.close(Duration::from_secs(1)).await;

        assert_eq!(
            res,
            Err(RuntimeError::HookFailed {
                tag: "h".into(),
                source: TaskError::fail("h broke"),
            })
        );
        assert_eq!(rec.outcome("h"), Some(EventKind::HookFailed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_cap_is_respected() {
        let (_rec, subs) = Recorder::set();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        let hooks = (0..8)
            .map(|i| {
                let (running, peak, done) = (running.clone(), peak.clone(), done.clone());
                let process: HookRef = HookFn::arc(move |_ctx: CancellationToken| {
                    let (running, peak, done) = (running.clone(), peak.clone(), done.clone());
                    async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        done.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                });
                hook(&format!("h{i}"), process)
            })
            .collect();

        let res = run_shutdown(hooks, &cfg(Duration::from_secs(5), 3, false), subs).await;

        assert!(res.is_ok());
        assert_eq!(done.load(Ordering::SeqCst), 8);
        assert!(peak.load(Ordering::SeqCst) <= 3, "peak {}", peak.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_late_hooks_are_still_attempted() {
        let (_rec, subs) = Recorder::set();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let late: HookRef = HookFn::arc(move |ctx: CancellationToken| {
            let flag = flag.clone();
            async move {
                flag.store(ctx.is_cancelled(), Ordering::SeqCst);
                Ok(())
            }
        });
        let hooks = vec![hook("B", failing("b broke")), hook("late", late)];

        let res = run_shutdown(hooks, &cfg(Duration::from_secs(5), 1, true), subs).await;
        assert!(matches!(res, Err(RuntimeError::HookFailed { ref tag, .. }) if tag == "B"));

        let observed = tokio::time::timeout(Duration::from_secs(1), async {
            while !ran.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(observed.is_ok(), "late hook never ran with a cancelled token");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_panicking_hook_is_a_failure() {
        let (rec, subs) = Recorder::set();
        let boom: HookRef = HookFn::arc(|_ctx: CancellationToken| async {
            if true {
                panic!("hook bug");
            }
            Ok(())
        });

        let cfg = cfg(Duration::from_secs(1), 1, true);
        let res = run_shutdown(vec![hook("boom", boom)], &cfg, subs.clone()).await;
        subs.close(Duration::from_secs(1)).await;

        assert_eq!(
            res,
            Err(RuntimeError::HookFailed {
                tag: "boom".into(),
                source: TaskError::fail("panicked: hook bug"),
            })
        );
        assert_eq!(rec.outcome("boom"), Some(EventKind::HookFailed));
    }
}
