//! # Orchestrator configuration.
//!
//! Provides [`Config`], the shutdown settings read by the orchestrator when a
//! termination request arrives.
//!
//! ## Fallback values
//! Non-positive values are never an error: `max_shutdown_time = 0s` and
//! `max_concurrent_shutdown = 0` silently fall back to
//! [`DEFAULT_MAX_SHUTDOWN_TIME`] and [`DEFAULT_MAX_CONCURRENT_SHUTDOWN`].

use std::time::Duration;

/// Default upper bound on how long shutdown hooks are awaited.
pub const DEFAULT_MAX_SHUTDOWN_TIME: Duration = Duration::from_secs(10);

/// Default number of shutdown hooks allowed to run at the same time.
pub const DEFAULT_MAX_CONCURRENT_SHUTDOWN: usize = 5;

/// Shutdown configuration.
///
/// ## Field semantics
/// - `max_shutdown_time`: deadline for the whole hook sequence (> 0)
/// - `max_concurrent_shutdown`: hook concurrency cap (> 0)
/// - `cancel_on_error`: promote the first hook failure to the overall result
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum time the coordinator waits for shutdown hooks.
    ///
    /// Bounds the *wait*, not the hooks themselves: a hook still running at
    /// the deadline is abandoned and keeps running unobserved.
    pub max_shutdown_time: Duration,

    /// Maximum number of shutdown hooks executing concurrently.
    pub max_concurrent_shutdown: usize,

    /// Whether a failing hook cancels the remaining waits and becomes the
    /// error returned by [`Orchestrator::wait`](crate::Orchestrator::wait).
    ///
    /// When `false`, hook failures are only reported to subscribers.
    pub cancel_on_error: bool,
}

impl Config {
    /// Sets the shutdown deadline; `Duration::ZERO` restores the default.
    pub fn set_max_shutdown_time(&mut self, duration: Duration) {
        self.max_shutdown_time = if duration.is_zero() {
            DEFAULT_MAX_SHUTDOWN_TIME
        } else {
            duration
        };
    }

    /// Sets the hook concurrency cap; `0` restores the default.
    pub fn set_max_concurrent_shutdown(&mut self, max: usize) {
        self.max_concurrent_shutdown = if max == 0 {
            DEFAULT_MAX_CONCURRENT_SHUTDOWN
        } else {
            max
        };
    }

    /// Returns a copy with every non-positive field replaced by its default.
    ///
    /// Used when a config is supplied wholesale through the builder, where the
    /// fields bypass the clamping setters.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.set_max_shutdown_time(self.max_shutdown_time);
        self.set_max_concurrent_shutdown(self.max_concurrent_shutdown);
        self
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_shutdown_time = 10s`
    /// - `max_concurrent_shutdown = 5`
    /// - `cancel_on_error = false`
    fn default() -> Self {
        Self {
            max_shutdown_time: DEFAULT_MAX_SHUTDOWN_TIME,
            max_concurrent_shutdown: DEFAULT_MAX_CONCURRENT_SHUTDOWN,
            cancel_on_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let mut cfg = Config::default();
        cfg.set_max_shutdown_time(Duration::from_secs(3));
        cfg.set_max_concurrent_shutdown(2);

        cfg.set_max_shutdown_time(Duration::ZERO);
        cfg.set_max_concurrent_shutdown(0);

        assert_eq!(cfg.max_shutdown_time, DEFAULT_MAX_SHUTDOWN_TIME);
        assert_eq!(cfg.max_concurrent_shutdown, DEFAULT_MAX_CONCURRENT_SHUTDOWN);
    }

    #[test]
    fn test_positive_values_are_kept() {
        let mut cfg = Config::default();
        cfg.set_max_shutdown_time(Duration::from_millis(1500));
        cfg.set_max_concurrent_shutdown(1);

        assert_eq!(cfg.max_shutdown_time, Duration::from_millis(1500));
        assert_eq!(cfg.max_concurrent_shutdown, 1);
    }

    #[test]
    fn test_sanitized_repairs_struct_literal() {
        let cfg = Config {
            max_shutdown_time: Duration::ZERO,
            max_concurrent_shutdown: 0,
            cancel_on_error: true,
        }
        .sanitized();

        assert_eq!(cfg.max_shutdown_time, Duration::from_secs(10));
        assert_eq!(cfg.max_concurrent_shutdown, 5);
        assert!(cfg.cancel_on_error);
    }
}
