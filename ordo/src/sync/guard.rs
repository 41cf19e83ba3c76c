use super::Mutex;

use futures::channel::oneshot;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by [`Mutex::acquire`].
///
/// The future resolves to a [`MutexGuard`] once the lock is handed to it.
pub struct Acquire {
    mutex: Mutex,

    /// Signalled by the queued critical section when it runs.
    granted: oneshot::Receiver<()>,

    /// Set once the guard has been produced.
    done: bool,
}

impl Acquire {
    pub(crate) fn new(mutex: Mutex) -> Self {
        let (grant, granted) = oneshot::channel();

        let holder = mutex.clone();
        mutex.lock(move || {
            // The requester is gone; pass the lock on.
            if grant.send(()).is_err() {
                holder.unlock();
            }
        });

        Self {
            mutex,
            granted,
            done: false,
        }
    }
}

impl Future for Acquire {
    type Output = MutexGuard;

    /// Resolves once the queued section has run.
    ///
    /// The grant channel is never dropped unsent while the mutex is alive,
    /// since its sender lives in the mutex's wait queue.
    ///
    /// # Panics
    ///
    /// Panics if polled again after producing its guard. A second guard would
    /// unlock a lock this acquisition no longer owns.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.done {
            panic!("`Acquire` polled after completion");
        }

        match Pin::new(&mut self.granted).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(_) => {
                self.done = true;
                Poll::Ready(MutexGuard {
                    mutex: self.mutex.clone(),
                })
            }
        }
    }
}

impl Drop for Acquire {
    /// Passes on a lock that was granted but never turned into a guard.
    fn drop(&mut self) {
        if self.done {
            return;
        }

        // Closing first makes a grant racing with this drop fail to send, in
        // which case the section unlocks on its own.
        self.granted.close();

        if let Ok(Some(())) = self.granted.try_recv() {
            self.mutex.unlock();
        }
    }
}

impl fmt::Debug for Acquire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquire").field("done", &self.done).finish()
    }
}

/// Guard returned by [`Mutex::acquire`].
///
/// Holds the lock until dropped, then hands it to the next waiter exactly as
/// [`Mutex::unlock`] does.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct MutexGuard {
    mutex: Mutex,
}

impl MutexGuard {
    /// Releases the lock. Equivalent to dropping the guard.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for MutexGuard {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}

impl fmt::Debug for MutexGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexGuard").finish_non_exhaustive()
    }
}
