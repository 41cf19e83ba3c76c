//! Error types surfaced by the task queue.

use thiserror::Error;

/// The failure side of a [`CompletionHandle`](crate::queue::CompletionHandle).
///
/// A `TaskError` only ever describes the task it was delivered to. The queue
/// itself keeps draining after any of these.
#[derive(Debug, Error)]
pub enum TaskError<E> {
    /// The operation ran and returned an error.
    #[error("operation failed: {0}")]
    Failed(E),

    /// The operation panicked, either while being called or while its
    /// future was polled. Holds the rendered panic payload.
    #[error("operation panicked: {0}")]
    Panicked(String),

    /// The executor discarded the task before it settled, e.g. because the
    /// runtime backing the queue was shut down.
    #[error("task was dropped before it settled")]
    Dropped,
}

impl<E> TaskError<E> {
    /// Returns `true` if the operation itself reported an error.
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskError::Failed(_))
    }

    /// Returns `true` if the operation panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked(_))
    }

    /// Returns `true` if the task never settled.
    pub fn is_dropped(&self) -> bool {
        matches!(self, TaskError::Dropped)
    }

    /// Consumes the error, returning the operation's own error if there was one.
    pub fn into_failure(self) -> Option<E> {
        match self {
            TaskError::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised while building a [`TaskQueue`](crate::queue::TaskQueue).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// No spawner was configured and no tokio runtime is running on the
    /// current thread.
    #[error("no spawner configured and no tokio runtime available")]
    NoRuntime,
}
