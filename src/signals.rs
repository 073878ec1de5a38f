//! # Termination sources.
//!
//! A [`TerminationSource`] yields termination requests. The orchestrator's
//! watcher waits for the first one and turns it into the shared cancellation.
//!
//! ## Built-in sources
//! - [`OsSignals`]: operating-system signals, registered eagerly at construction
//!   so that a signal arriving right after startup is not missed.
//! - [`Trigger`]: programmatic requests (embedding, tests).
//!
//! ## Signals
//! **Unix platforms:** every [`Signal`] maps to its POSIX counterpart.
//!
//! **Other platforms:** only [`Signal::Interrupt`] is supported (via
//! [`tokio::signal::ctrl_c`]); other kinds are ignored.
//!
//! ## Release
//! Once the orchestrator stops watching, it hands the source back through
//! [`TerminationSource::release`]. Tokio cannot uninstall its process-level
//! handler, so [`OsSignals`] keeps one listener alive that applies the
//! default disposition (terminate) to the next signal it sees.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Signal set used when none is supplied.
pub const DEFAULT_SIGNALS: [Signal; 3] = [Signal::Interrupt, Signal::Terminate, Signal::Hangup];

/// Termination request kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` / Ctrl-C.
    Interrupt,
    /// `SIGTERM`, the default kill signal (systemd, Kubernetes).
    Terminate,
    /// `SIGHUP`, controlling terminal closed.
    Hangup,
    /// `SIGQUIT`.
    Quit,
}

impl Signal {
    /// Raw signal number.
    #[cfg(unix)]
    pub fn raw(self) -> i32 {
        use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};

        match self {
            Signal::Interrupt => SIGINT,
            Signal::Terminate => SIGTERM,
            Signal::Hangup => SIGHUP,
            Signal::Quit => SIGQUIT,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Hangup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
        })
    }
}

/// Source of termination requests.
///
/// `recv` resolves with a short description of the request, or `None` once
/// the source can no longer produce requests.
#[async_trait]
pub trait TerminationSource: Send + 'static {
    /// Waits for the next termination request.
    async fn recv(&mut self) -> Option<String>;

    /// Called once when the watcher stops listening.
    ///
    /// Later requests must reach the default handling of the platform. The
    /// default implementation just drops the source.
    fn release(self: Box<Self>) {}
}

/// Operating-system signal listener.
pub struct OsSignals {
    #[cfg(unix)]
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    interrupt: bool,
}

impl OsSignals {
    /// Registers listeners for `signals`; an empty set means [`DEFAULT_SIGNALS`].
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn new(signals: &[Signal]) -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let signals = if signals.is_empty() {
            &DEFAULT_SIGNALS[..]
        } else {
            signals
        };

        let mut streams = Vec::with_capacity(signals.len());
        for &sig in signals {
            if streams.iter().any(|(s, _)| *s == sig) {
                continue;
            }
            let kind = match sig {
                Signal::Interrupt => SignalKind::interrupt(),
                Signal::Terminate => SignalKind::terminate(),
                Signal::Hangup => SignalKind::hangup(),
                Signal::Quit => SignalKind::quit(),
            };
            streams.push((sig, signal(kind)?));
        }
        Ok(Self { streams })
    }

    /// Registers listeners for `signals`; an empty set means [`DEFAULT_SIGNALS`].
    #[cfg(not(unix))]
    pub fn new(signals: &[Signal]) -> std::io::Result<Self> {
        let interrupt = signals.is_empty() || signals.contains(&Signal::Interrupt);
        Ok(Self { interrupt })
    }

    #[cfg(unix)]
    async fn next_signal(&mut self) -> Option<Signal> {
        if self.streams.is_empty() {
            return None;
        }
        let pending = self.streams.iter_mut().map(|(sig, stream)| {
            let sig = *sig;
            Box::pin(async move { stream.recv().await.map(|()| sig) })
        });
        let (received, _, _) = futures::future::select_all(pending).await;
        received
    }

    #[cfg(not(unix))]
    async fn next_signal(&mut self) -> Option<Signal> {
        if !self.interrupt {
            return None;
        }
        tokio::signal::ctrl_c().await.ok().map(|()| Signal::Interrupt)
    }
}

#[async_trait]
impl TerminationSource for OsSignals {
    async fn recv(&mut self) -> Option<String> {
        self.next_signal().await.map(|sig| sig.to_string())
    }

    fn release(mut self: Box<Self>) {
        tokio::spawn(async move {
            if let Some(sig) = self.next_signal().await {
                tracing::debug!(%sig, "signal after release, applying default handling");
                default_handling(sig);
            }
        });
    }
}

#[cfg(unix)]
fn default_handling(sig: Signal) {
    if let Err(e) = signal_hook::low_level::emulate_default_handler(sig.raw()) {
        tracing::error!(%sig, error = %e, "failed to apply default signal handling");
    }
}

// Ctrl-C terminates a console process by default.
#[cfg(not(unix))]
fn default_handling(_sig: Signal) {
    std::process::exit(130);
}

/// Programmatic termination source.
///
/// Clones share state: firing any clone wakes the watcher holding another.
/// Each receiving handle delivers the request once, then reports itself closed.
///
/// ```rust
/// use gracevisor::{Orchestrator, Trigger};
///
/// # #[tokio::main]
/// # async fn main() {
/// let trigger = Trigger::new();
/// let orch = Orchestrator::builder().with_source(trigger.clone()).build();
///
/// trigger.fire();
/// assert!(orch.wait().await.is_ok());
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Trigger {
    token: CancellationToken,
    delivered: bool,
}

impl Trigger {
    /// Creates an unfired trigger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination. Idempotent.
    pub fn fire(&self) {
        self.token.cancel();
    }

    /// Returns `true` once [`fire`](Self::fire) has been called.
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[async_trait]
impl TerminationSource for Trigger {
    async fn recv(&mut self) -> Option<String> {
        if self.delivered {
            return None;
        }
        self.token.cancelled().await;
        self.delivered = true;
        Some("manual trigger".to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_signal_names() {
        let names: Vec<_> = DEFAULT_SIGNALS.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["SIGINT", "SIGTERM", "SIGHUP"]);
    }

    #[tokio::test]
    async fn test_trigger_wakes_receiver() {
        let trigger = Trigger::new();
        let mut source = trigger.clone();

        let waiter = tokio::spawn(async move { source.recv().await });
        trigger.fire();

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.as_deref(), Some("manual trigger"));
        assert!(trigger.is_fired());
    }

    #[tokio::test]
    async fn test_trigger_delivers_once() {
        let trigger = Trigger::new();
        let mut source = trigger.clone();
        trigger.fire();

        assert!(source.recv().await.is_some());
        assert!(source.recv().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_os_signals_register_default_set() {
        let signals = OsSignals::new(&[]).unwrap();
        assert_eq!(signals.streams.len(), 3);

        let dedup = OsSignals::new(&[Signal::Terminate, Signal::Terminate]).unwrap();
        assert_eq!(dedup.streams.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_raw_numbers_match_platform() {
        assert_eq!(Signal::Interrupt.raw(), signal_hook::consts::SIGINT);
        assert_eq!(Signal::Terminate.raw(), signal_hook::consts::SIGTERM);
    }
}
