//! # Example: tcp_server
//!
//! A TCP echo server whose accept loop is stopped by a shutdown hook, next to
//! a deliberately stuck hook that overruns the deadline.
//!
//! Demonstrates how to:
//! - Run a server as a plain background task ([`Orchestrator::register_task`]).
//! - Stop it from a tagged hook ([`Orchestrator::register_shutdown_hook_with_tag`]).
//! - Enable `cancel_on_error` and a short `max_shutdown_time`.
//!
//! ## Flow
//! ```text
//! register_task("echo-server")      ──► accept loop on 127.0.0.1:8070
//! hook "tcp-server"                 ──► stop accept loop, drain connections
//! hook <untagged>                   ──► sleeps 20s, then fails
//! Ctrl-C ──► hooks run concurrently
//!     ├─► tcp-server ─► HookSucceeded
//!     ├─► <untagged> ─► HookTimedOut (abandoned at 1s)
//!     └─► wait() returns DeadlineExceeded
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example tcp_server
//! # in another shell: nc 127.0.0.1 8070
//! ```

use std::time::Duration;

use gracevisor::{HookFn, HookRef, Orchestrator, TaskError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const ADDR: &str = "127.0.0.1:8070";

async fn echo(mut stream: TcpStream, stop: CancellationToken) {
    let mut buf = [0u8; 1024];
    loop {
        let n = tokio::select! {
            _ = stop.cancelled() => return,
            read = stream.read(&mut buf) => match read {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            },
        };
        if stream.write_all(&buf[..n]).await.is_err() {
            return;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let orch = Orchestrator::new();
    let stop = CancellationToken::new();
    let conns = TaskTracker::new();

    let (server_stop, server_conns) = (stop.clone(), conns.clone());
    orch.register_task("echo-server", move || {
        let (stop, conns) = (server_stop.clone(), server_conns.clone());
        async move {
            let listener = TcpListener::bind(ADDR).await.map_err(TaskError::fail)?;
            tracing::info!(addr = ADDR, "echo server listening");
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    accepted = listener.accept() => {
                        let (stream, peer) = accepted.map_err(TaskError::fail)?;
                        tracing::debug!(%peer, "accepted");
                        conns.spawn(echo(stream, stop.clone()));
                    }
                }
            }
            Ok(())
        }
    });

    let stop_server: HookRef = HookFn::arc(move |ctx: CancellationToken| {
        let (stop, conns) = (stop.clone(), conns.clone());
        async move {
            tracing::info!(addr = ADDR, "stopping echo server");
            stop.cancel();
            conns.close();
            tokio::select! {
                _ = conns.wait() => Ok(()),
                _ = ctx.cancelled() => Err(TaskError::Canceled),
            }
        }
    });
    orch.register_shutdown_hook_with_tag(stop_server, "tcp-server");

    let stuck: HookRef = HookFn::arc(|_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_secs(20)).await;
        Err(TaskError::fail("err 2"))
    });
    orch.register_shutdown_hook(stuck);

    orch.set_cancel_on_error(true);
    orch.set_max_shutdown_time(Duration::from_secs(1));

    if let Err(e) = orch.wait().await {
        tracing::error!(error = %e, label = e.as_label(), "failed while shutting down gracefully");
    }
    Ok(())
}
