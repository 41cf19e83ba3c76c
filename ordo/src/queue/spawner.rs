use futures::future::BoxFuture;

/// An execution backend for dispatched operations.
///
/// The queue never polls operations itself. Once an operation is dispatched,
/// the future driving it (operation, completion, then the hand-off to the
/// next pending task) is given to a `Spawner`, which must poll it to
/// completion or drop it.
///
/// Dropping the future instead of running it is allowed: the task's handle
/// then resolves to [`TaskError::Dropped`](crate::TaskError::Dropped) and the
/// queue moves on to the next pending task.
pub trait Spawner: Send + Sync + 'static {
    /// Hands a dispatched operation over to the backend.
    fn spawn(&self, future: BoxFuture<'static, ()>);
}

#[cfg(feature = "tokio")]
impl Spawner for tokio::runtime::Handle {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        // The join handle is not needed, completion flows through the task's
        // own channel.
        drop(tokio::runtime::Handle::spawn(self, future));
    }
}
