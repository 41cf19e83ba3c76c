use super::guard::Acquire;

use parking_lot::Mutex as StateLock;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A queued critical section.
type CriticalSection = Box<dyn FnOnce() + Send + 'static>;

/// A cooperative mutual-exclusion lock over critical sections.
///
/// Unlike a guard-based mutex, `Mutex` hands out exclusive access by
/// *calling* the critical section it was given. The first section runs
/// immediately; later ones are queued and run, in FIFO order, each time the
/// current holder calls [`unlock`](Mutex::unlock). Ownership passes straight
/// from one holder to the next: the mutex is never observed unheld while
/// sections are waiting.
///
/// The protocol is the caller's responsibility. Every section must eventually
/// call `unlock` exactly once; a section that never does starves every
/// waiter behind it. A section calling [`lock`](Mutex::lock) on the mutex it
/// holds queues behind itself and therefore never runs.
///
/// For scoped access that releases on every exit path, see
/// [`acquire`](Mutex::acquire).
///
/// `Mutex` is a cheap handle; clones refer to the same lock, which is how a
/// critical section gets hold of the mutex it must release.
#[derive(Clone, Default)]
pub struct Mutex {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Lock flag and wait queue.
    ///
    /// Never held while a critical section runs, so sections may call back
    /// into the mutex synchronously.
    state: StateLock<State>,
}

#[derive(Default)]
struct State {
    /// `true` while a section runs or any are queued.
    locked: bool,

    /// Sections waiting for the lock, earliest first.
    waiters: VecDeque<CriticalSection>,
}

/// Observable state of a [`Mutex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutexState {
    /// Nobody holds the lock.
    Unheld,
    /// A section holds the lock and nothing is queued.
    HeldNoWaiters,
    /// A section holds the lock and at least one more is queued.
    HeldWithWaiters,
}

impl Mutex {
    /// Creates a new, unheld mutex.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `critical_section` with exclusive access.
    ///
    /// If the mutex is unheld, it becomes held and the section is called
    /// right away, before `lock` returns. Otherwise the section is queued and
    /// called later from within the `unlock` that hands the lock to it.
    ///
    /// The section must call [`unlock`](Mutex::unlock) once it is done, either
    /// before returning or later from asynchronous work it started.
    pub fn lock<F>(&self, critical_section: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.inner.state.lock();

            if state.locked {
                state.waiters.push_back(Box::new(critical_section));
                trace!(waiters = state.waiters.len(), "mutex held, critical section queued");
                return;
            }

            state.locked = true;
        }

        trace!("mutex acquired");
        critical_section();
    }

    /// Runs `critical_section` only if the mutex is currently unheld.
    ///
    /// Returns `true` if the section ran (and now holds the lock), `false` if
    /// the mutex was held. The section is never queued.
    pub fn try_lock<F>(&self, critical_section: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.inner.state.lock();

            if state.locked {
                return false;
            }

            state.locked = true;
        }

        trace!("mutex acquired");
        critical_section();
        true
    }

    /// Releases the lock, handing it to the earliest queued section if any.
    ///
    /// The next section is called from within this `unlock`, and the mutex
    /// stays held throughout. Calling `unlock` on an unheld mutex does
    /// nothing.
    pub fn unlock(&self) {
        let next = {
            let mut state = self.inner.state.lock();

            if !state.locked {
                trace!("unlock on an unheld mutex ignored");
                return;
            }

            match state.waiters.pop_front() {
                Some(next) => next,
                None => {
                    state.locked = false;
                    trace!("mutex released");
                    return;
                }
            }
        };

        trace!("mutex handed off to next waiter");
        next();
    }

    /// Returns a future that resolves to a guard once the lock is held.
    ///
    /// The request joins the wait queue when `acquire` is called, not when
    /// the future is first polled, so FIFO order follows call order. The
    /// guard releases the lock when dropped.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let guard = mutex.acquire().await;
    /// // exclusive access until `guard` is dropped
    /// ```
    pub fn acquire(&self) -> Acquire {
        Acquire::new(self.clone())
    }

    /// Returns `true` while a section holds the lock or any are queued.
    pub fn is_locked(&self) -> bool {
        self.inner.state.lock().locked
    }

    /// Number of queued critical sections.
    pub fn waiters(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Returns the current state of the mutex.
    pub fn state(&self) -> MutexState {
        let state = self.inner.state.lock();

        match (state.locked, state.waiters.is_empty()) {
            (false, _) => MutexState::Unheld,
            (true, true) => MutexState::HeldNoWaiters,
            (true, false) => MutexState::HeldWithWaiters,
        }
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Mutex")
            .field("locked", &state.locked)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}
