//! # Example: basic
//!
//! One ticking background task and two shutdown hooks, stopped by Ctrl-C.
//!
//! Demonstrates how to:
//! - Register a token-aware task with [`Orchestrator::register_task_with_token`].
//! - Register tagged hooks with [`Orchestrator::on_shutdown`].
//! - Observe per-hook outcomes through the default [`LogWriter`](gracevisor::LogWriter).
//!
//! ## Flow
//! ```text
//! Orchestrator::new()  ──► listen for SIGINT / SIGTERM / SIGHUP
//! register_task_with_token("ticker")
//! on_shutdown("flush-metrics"), on_shutdown("close-db")
//! Ctrl-C ──► ShutdownRequested
//!     ├─► flush-metrics ─► HookSucceeded
//!     ├─► close-db      ─► HookSucceeded
//!     └─► ShutdownCompleted ─► wait() returns Ok
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic
//! ```

use std::time::Duration;

use gracevisor::{Orchestrator, TaskError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let orch = Orchestrator::new();
    orch.set_max_shutdown_time(Duration::from_secs(3));
    orch.set_max_shutdown_process(2);

    orch.register_task_with_token("ticker", |ctx: CancellationToken| async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        let mut n = 0u64;
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Ok::<_, TaskError>(()),
                _ = tick.tick() => {
                    n += 1;
                    tracing::info!(n, "tick");
                }
            }
        }
    });

    orch.on_shutdown("flush-metrics", |_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok::<_, TaskError>(())
    });
    orch.on_shutdown("close-db", |ctx: CancellationToken| async move {
        tokio::select! {
            _ = ctx.cancelled() => Err(TaskError::Canceled),
            _ = tokio::time::sleep(Duration::from_millis(500)) => Ok(()),
        }
    });

    tracing::info!(hooks = orch.hook_count(), "running; press Ctrl-C to stop");
    orch.wait().await?;
    tracing::info!("bye");
    Ok(())
}
