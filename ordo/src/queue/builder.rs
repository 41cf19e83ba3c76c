use super::{Spawner, TaskQueue};
use crate::error::BuildError;

/// Default label for queues built without [`TaskQueueBuilder::name`].
pub(crate) const DEFAULT_QUEUE_NAME: &str = "task-queue";

/// Builder for configuring and creating a task queue.
///
/// `TaskQueueBuilder` allows customizing the queue before constructing it.
/// It currently supports a name, used to label log events, and the
/// [`Spawner`] that runs dispatched operations.
///
/// # Examples
///
/// ```rust,ignore
/// let queue = TaskQueue::builder()
///     .name("records")
///     .spawner(runtime.handle().clone())
///     .build()?;
/// ```
pub struct TaskQueueBuilder {
    /// Label attached to every log event emitted by the queue.
    name: String,

    /// Explicit execution backend, if any.
    spawner: Option<Box<dyn Spawner>>,
}

impl TaskQueueBuilder {
    /// Creates a new `TaskQueueBuilder` with default configuration.
    ///
    /// By default the queue is named `"task-queue"` and runs its operations on
    /// the tokio runtime that is current when [`build`](Self::build) is called.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
            spawner: None,
        }
    }

    /// Sets the name of the queue.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the backend that runs dispatched operations.
    pub fn spawner(mut self, spawner: impl Spawner) -> Self {
        self.spawner = Some(Box::new(spawner));
        self
    }

    /// Builds the queue with the configured options.
    ///
    /// Fails with [`BuildError::NoRuntime`] if no spawner was set and there is
    /// no tokio runtime to fall back to.
    pub fn build(self) -> Result<TaskQueue, BuildError> {
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => ambient_spawner()?,
        };

        Ok(TaskQueue::from_parts(self.name, spawner))
    }
}

impl Default for TaskQueueBuilder {
    /// Creates a default `TaskQueueBuilder`.
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tokio")]
fn ambient_spawner() -> Result<Box<dyn Spawner>, BuildError> {
    tokio::runtime::Handle::try_current()
        .map(|handle| Box::new(handle) as Box<dyn Spawner>)
        .map_err(|_| BuildError::NoRuntime)
}

#[cfg(not(feature = "tokio"))]
fn ambient_spawner() -> Result<Box<dyn Spawner>, BuildError> {
    Err(BuildError::NoRuntime)
}
