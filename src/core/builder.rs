use std::sync::Arc;

use crate::config::Config;
use crate::signals::{OsSignals, Signal, TerminationSource};
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};

use super::orchestrator::Orchestrator;

/// Builder for constructing an [`Orchestrator`] with custom settings.
///
/// Defaults: [`Config::default`], the OS signals in
/// [`DEFAULT_SIGNALS`](crate::DEFAULT_SIGNALS), and a single [`LogWriter`] subscriber.
pub struct OrchestratorBuilder {
    cfg: Config,
    signals: Vec<Signal>,
    source: Option<Box<dyn TerminationSource>>,
    subscribers: Option<Vec<Arc<dyn Subscribe>>>,
}

impl OrchestratorBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            cfg: Config::default(),
            signals: Vec::new(),
            source: None,
            subscribers: None,
        }
    }

    /// Sets the shutdown configuration. Non-positive fields fall back to defaults.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg.sanitized();
        self
    }

    /// Sets the OS signals that request termination.
    ///
    /// An empty set keeps the default signals. Ignored when a custom source
    /// is installed with [`with_source`](Self::with_source).
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    /// Replaces OS signal handling with a custom termination source.
    pub fn with_source(mut self, source: impl TerminationSource) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Replaces the default [`LogWriter`] with the given subscribers.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues. Pass an empty vector to disable event delivery.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = Some(subscribers);
        self
    }

    /// Builds the orchestrator and starts watching for termination requests.
    ///
    /// If OS signal registration fails, the failure is logged and only task
    /// failures or explicit requests can start the shutdown.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn build(self) -> Orchestrator {
        let subscribers = self
            .subscribers
            .unwrap_or_else(|| vec![Arc::new(LogWriter::new())]);
        let subs = Arc::new(SubscriberSet::new(subscribers));

        let source = match self.source {
            Some(source) => Some(source),
            None => match OsSignals::new(&self.signals) {
                Ok(signals) => Some(Box::new(signals) as Box<dyn TerminationSource>),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to register termination signals");
                    None
                }
            },
        };

        Orchestrator::new_internal(self.cfg, source, subs)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
