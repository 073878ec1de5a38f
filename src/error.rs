//! Error types used by the gracevisor runtime, tasks and shutdown hooks.
//!
//! This module defines two main error enums:
//!
//! - [`TaskError`]: errors returned by background tasks and shutdown hooks.
//! - [`RuntimeError`]: the single aggregated error returned by
//!   [`Orchestrator::wait`](crate::Orchestrator::wait).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by task and hook execution.
///
/// Returned by user code registered as a background task or a shutdown hook.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Execution stopped because the cancellation token fired.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use gracevisor::TaskError;
    ///
    /// let io = std::io::Error::other("disk gone");
    /// let err = TaskError::fail(io);
    /// assert_eq!(err.to_string(), "execution failed: disk gone");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }
}

/// # Errors produced by the orchestrator.
///
/// At most one of these crosses [`Orchestrator::wait`](crate::Orchestrator::wait):
/// the first failure observed among background tasks and the shutdown sequence.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// A background task returned an error.
    #[error("task {task:?} failed: {source}")]
    TaskFailed {
        /// Name of the failing task.
        task: String,
        /// Error returned by the task.
        source: TaskError,
    },

    /// A background task panicked.
    #[error("task {task:?} panicked: {info}")]
    TaskPanicked {
        /// Name of the panicking task.
        task: String,
        /// Panic payload rendered as text.
        info: String,
    },

    /// A shutdown hook failed while `cancel_on_error` was enabled.
    #[error("shutdown hook {tag:?} failed: {source}")]
    HookFailed {
        /// Tag of the failing hook.
        tag: String,
        /// Error returned by the hook.
        source: TaskError,
    },

    /// The shutdown deadline elapsed before every hook was observed.
    #[error("shutdown deadline {timeout:?} exceeded; pending: {pending:?}")]
    DeadlineExceeded {
        /// The configured `max_shutdown_time`.
        timeout: Duration,
        /// Tags of the hooks whose wait was abandoned.
        pending: Vec<String>,
    },

    /// `wait` was called on an orchestrator that already ran its shutdown.
    #[error("orchestrator already waited")]
    AlreadyWaited,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gracevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::DeadlineExceeded { timeout: Duration::from_secs(5), pending: vec![] };
    /// assert_eq!(err.as_label(), "runtime_deadline_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::TaskFailed { .. } => "runtime_task_failed",
            RuntimeError::TaskPanicked { .. } => "runtime_task_panicked",
            RuntimeError::HookFailed { .. } => "runtime_hook_failed",
            RuntimeError::DeadlineExceeded { .. } => "runtime_deadline_exceeded",
            RuntimeError::AlreadyWaited => "runtime_already_waited",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::TaskFailed { task, source } => {
                format!("task={task} {}", source.as_message())
            }
            RuntimeError::TaskPanicked { task, info } => format!("task={task} panic: {info}"),
            RuntimeError::HookFailed { tag, source } => {
                format!("hook={tag} {}", source.as_message())
            }
            RuntimeError::DeadlineExceeded { timeout, pending } => {
                format!("deadline exceeded after {timeout:?}; pending hooks={pending:?}")
            }
            RuntimeError::AlreadyWaited => "orchestrator already waited".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let hook = RuntimeError::HookFailed {
            tag: "db".into(),
            source: TaskError::fail("boom"),
        };
        assert_eq!(hook.as_label(), "runtime_hook_failed");
        assert_eq!(hook.as_message(), "hook=db error: boom");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    }

    #[test]
    fn test_display_includes_source() {
        let err = RuntimeError::TaskFailed {
            task: "server".into(),
            source: TaskError::fail("bind: address in use"),
        };
        assert_eq!(
            err.to_string(),
            "task \"server\" failed: execution failed: bind: address in use"
        );
    }
}
