use super::TaskId;
use crate::error::TaskError;

use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A handle to a submitted task.
///
/// A `CompletionHandle` resolves once its task has settled: with the
/// operation's value, or with the [`TaskError`] describing why it did not
/// produce one. Each handle settles exactly once and independently of every
/// other task in the queue.
///
/// Dropping the handle does **not** cancel the task; it only discards the
/// ability to observe its result.
#[must_use = "dropping a completion handle discards the task's result"]
pub struct CompletionHandle<T, E> {
    id: TaskId,

    /// Receiving half of the task's completion channel.
    receiver: oneshot::Receiver<Result<T, TaskError<E>>>,
}

impl<T, E> CompletionHandle<T, E> {
    pub(crate) fn new(id: TaskId, receiver: oneshot::Receiver<Result<T, TaskError<E>>>) -> Self {
        Self { id, receiver }
    }

    /// The id of the task this handle belongs to.
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<T, E> Future for CompletionHandle<T, E> {
    type Output = Result<T, TaskError<E>>;

    /// Polls the handle.
    ///
    /// A closed channel means the task was dropped without settling, which
    /// is reported as [`TaskError::Dropped`].
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TaskError::Dropped)))
    }
}
