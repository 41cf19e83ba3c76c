use super::Settle;
use crate::error::TaskError;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, BoxFuture};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Identifies a task within the queue it was submitted to.
///
/// Ids are handed out in submission order, so they also reflect the order in
/// which tasks start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// Returns the raw sequence number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pending unit of work, with the result type erased.
///
/// This lets the queue hold operations of arbitrary output types in a single
/// FIFO through `Box<dyn Runnable>`.
pub(crate) trait Runnable: Send {
    /// The id assigned at submission.
    fn id(&self) -> TaskId;

    /// Calls the operation and returns the future that drives it to
    /// settlement.
    ///
    /// The operation itself is invoked synchronously, before this returns.
    /// The returned future never panics and always delivers exactly one
    /// outcome to the task's completion handle (unless it is dropped first).
    /// `settle` is released before the outcome is delivered and dropped
    /// right after.
    fn run(self: Box<Self>, settle: Settle) -> BoxFuture<'static, ()>;
}

/// A submitted operation along with the sending half of its completion.
pub(crate) struct Task<F, T, E> {
    id: TaskId,

    /// The caller-supplied operation. Called once, on dispatch.
    operation: F,

    /// Where the outcome goes. Dropping it unsent resolves the handle to
    /// [`TaskError::Dropped`].
    completion: oneshot::Sender<Result<T, TaskError<E>>>,
}

impl<F, T, E> Task<F, T, E> {
    pub(crate) fn new(
        id: TaskId,
        operation: F,
        completion: oneshot::Sender<Result<T, TaskError<E>>>,
    ) -> Self {
        Self {
            id,
            operation,
            completion,
        }
    }
}

impl<F, Fut, T, E> Runnable for Task<F, T, E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn id(&self) -> TaskId {
        self.id
    }

    fn run(self: Box<Self>, settle: Settle) -> BoxFuture<'static, ()> {
        let Task {
            id,
            operation,
            completion,
        } = *self;

        let future = match panic::catch_unwind(AssertUnwindSafe(operation)) {
            Ok(future) => future,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(task = %id, panic = %message, "operation panicked before returning a future");
                complete(id, settle, completion, Err(TaskError::Panicked(message)));
                return future::ready(()).boxed();
            }
        };

        async move {
            let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(TaskError::Failed(e)),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(task = %id, panic = %message, "operation panicked");
                    Err(TaskError::Panicked(message))
                }
            };

            complete(id, settle, completion, outcome);
        }
        .boxed()
    }
}

/// Delivers the outcome to the task's handle.
///
/// The queue stops counting the task as in flight before the handle can
/// observe the outcome. Dropping `settle` at the end dispatches the next task.
fn complete<T, E>(
    id: TaskId,
    mut settle: Settle,
    completion: oneshot::Sender<Result<T, TaskError<E>>>,
    outcome: Result<T, TaskError<E>>,
) {
    let ok = outcome.is_ok();
    settle.release();

    if completion.send(outcome).is_err() {
        debug!(task = %id, ok, "task settled, handle already dropped");
    } else {
        debug!(task = %id, ok, "task settled");
    }
}

/// Renders a panic payload the way the default panic hook does.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
