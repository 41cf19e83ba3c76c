//! Cooperative mutual exclusion.
//!
//! This module provides [`Mutex`], a lock that grants exclusive access by
//! running queued critical sections one at a time, and a scoped wrapper on
//! top of it:
//! - [`Mutex::lock`] / [`Mutex::unlock`] — the manual, callback-based protocol.
//! - [`Mutex::acquire`] — awaits the lock and returns a [`MutexGuard`] that
//!   releases on drop.
//!
//! ## Design notes
//!
//! - Waiters are served strictly first-in, first-out, with no priorities.
//! - Hand-off is direct: releasing with waiters queued runs the next one
//!   immediately, so the lock is never observed free in between.
//! - There is no owner tracking, reentrancy, timeout or deadlock detection.
//! - Bookkeeping never suspends and never runs user code while holding its
//!   internal lock.

mod guard;
mod mutex;

pub use guard::{Acquire, MutexGuard};
pub use mutex::{Mutex, MutexState};
