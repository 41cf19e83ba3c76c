//! One-at-a-time FIFO execution of asynchronous operations.
//!
//! A [`TaskQueue`] accepts operations through [`TaskQueue::submit`] and runs
//! them strictly one after another, in the order they were submitted. Every
//! submission gets its own [`CompletionHandle`] which settles with that
//! operation's outcome only; a failing or panicking operation never stops the
//! queue.
//!
//! ## Scheduling
//!
//! The queue keeps a FIFO of pending tasks and an in-flight counter that is
//! always `0` or `1`. Whenever a task is submitted or settles, the queue
//! *drains*: if nothing is in flight and something is pending, the head is
//! popped, marked in flight, its operation is called and the resulting future
//! is handed to the queue's [`Spawner`]. When that future finishes the
//! in-flight mark is cleared, the handle is settled and the queue drains again.
//!
//! All of this bookkeeping is synchronous. Operations may suspend as often as
//! they like, but the queue's own state transitions never do.

mod builder;
mod handle;
mod spawner;
mod task;

pub use builder::TaskQueueBuilder;
pub use handle::CompletionHandle;
pub use spawner::Spawner;
pub use task::TaskId;

use crate::error::TaskError;
use task::{Runnable, Task};

use futures::FutureExt;
use futures::channel::oneshot;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{Instrument, debug, debug_span, trace};

/// A FIFO queue that runs at most one operation at a time.
///
/// `TaskQueue` is a cheap handle: clones share the same pending tasks and
/// in-flight state, so a queue can be handed to every component that needs
/// its writes serialized.
///
/// # Example
///
/// ```rust,ignore
/// let queue = TaskQueue::new();
///
/// let a = queue.submit(|| async { Ok::<_, Infallible>(1) });
/// let b = queue.submit(|| async { Ok::<_, Infallible>(2) });
///
/// assert_eq!(a.await.unwrap() + b.await.unwrap(), 3);
/// ```
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
}

/// State shared by every clone of a queue.
struct Shared {
    /// Label used in log events.
    name: String,

    /// Runs dispatched operations.
    spawner: Box<dyn Spawner>,

    /// Pending tasks and the in-flight mark.
    ///
    /// Only ever held for bookkeeping; never while an operation is called or
    /// a future is spawned.
    state: Mutex<QueueState>,
}

struct QueueState {
    /// Tasks waiting to start, in submission order.
    pending: VecDeque<Box<dyn Runnable>>,

    /// Number of tasks currently executing. Always `0` or `1`.
    in_flight: usize,

    /// Id handed to the next submission.
    next_id: u64,

    /// Set while a drain loop is dispatching tasks.
    draining: bool,
}

impl TaskQueue {
    /// Creates a queue backed by the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside the context of a tokio runtime. Use
    /// [`TaskQueue::builder`] to supply a spawner explicitly or to handle
    /// the missing runtime as an error.
    #[cfg(feature = "tokio")]
    pub fn new() -> Self {
        let handle = tokio::runtime::Handle::try_current()
            .unwrap_or_else(|_| panic!("TaskQueue::new must be called within a tokio runtime"));

        Self::from_parts(builder::DEFAULT_QUEUE_NAME.to_string(), Box::new(handle))
    }

    /// Returns a builder to configure a new queue.
    pub fn builder() -> TaskQueueBuilder {
        TaskQueueBuilder::new()
    }

    pub(crate) fn from_parts(name: String, spawner: Box<dyn Spawner>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                spawner,
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    in_flight: 0,
                    next_id: 0,
                    draining: false,
                }),
            }),
        }
    }

    /// Submits an operation to the queue.
    ///
    /// The operation is called once, after every previously submitted
    /// operation has settled. If the queue is idle it is called right away,
    /// before `submit` returns; its outcome is still only observable through
    /// the returned handle.
    ///
    /// The operation's future may do any amount of asynchronous work; the
    /// next task does not start until it resolves.
    pub fn submit<F, Fut, T, E>(&self, operation: F) -> CompletionHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel::<Result<T, TaskError<E>>>();

        let id = {
            let mut state = self.shared.state.lock();
            let id = TaskId(state.next_id);
            state.next_id += 1;

            state
                .pending
                .push_back(Box::new(Task::new(id, operation, sender)));

            debug!(
                queue = %self.shared.name,
                task = %id,
                pending = state.pending.len(),
                in_flight = state.in_flight,
                "task submitted"
            );

            id
        };

        self.shared.drain();

        CompletionHandle::new(id, receiver)
    }

    /// The name this queue was built with.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Number of submitted tasks that have not started yet.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Number of tasks currently executing: `0` or `1`.
    pub fn in_flight(&self) -> usize {
        self.shared.state.lock().in_flight
    }

    /// Returns `true` if nothing is executing and nothing is pending.
    pub fn is_idle(&self) -> bool {
        let state = self.shared.state.lock();
        state.in_flight == 0 && state.pending.is_empty()
    }
}

#[cfg(feature = "tokio")]
impl Default for TaskQueue {
    /// Same as [`TaskQueue::new`].
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("TaskQueue")
            .field("name", &self.shared.name)
            .field("pending", &state.pending.len())
            .field("in_flight", &state.in_flight)
            .finish()
    }
}

impl Shared {
    /// Dispatches pending tasks until one is in flight or none are left.
    ///
    /// No-op when a task is already executing or nothing is pending, so it
    /// is safe to call after every state change. Only the outermost call
    /// loops: a call made while another one is dispatching (e.g. from a
    /// spawner that drops the future it was given) returns right away, and
    /// the outer loop picks up the state it left behind.
    fn drain(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();

            if state.draining {
                return;
            }

            state.draining = true;
        }

        loop {
            let task = {
                let mut state = self.state.lock();

                let next = if state.in_flight == 0 {
                    state.pending.pop_front()
                } else {
                    None
                };

                match next {
                    Some(task) => {
                        state.in_flight = 1;
                        task
                    }
                    None => {
                        // Cleared under the same lock as the check above, so a
                        // concurrent settle either sees it set and leaves the
                        // work to this loop, or sees it clear and drains itself.
                        state.draining = false;
                        if state.pending.is_empty() {
                            trace!(queue = %self.name, "queue drained");
                        }
                        return;
                    }
                }
            };

            let id = task.id();
            debug!(queue = %self.name, task = %id, "task dispatched");

            let future = task.run(Settle::new(Arc::clone(self)));
            let span = debug_span!("task", queue = %self.name, task = %id);

            self.spawner.spawn(future.instrument(span).boxed());
        }
    }
}

/// Tracks the in-flight task from dispatch to settlement.
///
/// Handed to the task when it is dispatched and owned by the future driving
/// it. [`release`](Settle::release) clears the in-flight mark before the
/// outcome is sent; dropping the guard clears it if that never happened
/// (the spawner discarded the future) and dispatches the next task.
pub(crate) struct Settle {
    shared: Arc<Shared>,
    released: bool,
}

impl Settle {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            released: false,
        }
    }

    /// Clears the in-flight mark. The next task is dispatched once the guard
    /// is dropped.
    pub(crate) fn release(&mut self) {
        if !self.released {
            self.shared.state.lock().in_flight = 0;
            self.released = true;
        }
    }
}

impl Drop for Settle {
    fn drop(&mut self) {
        self.release();
        self.shared.drain();
    }
}
