#![allow(dead_code)]

use futures::future::BoxFuture;
use ordo::Spawner;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Routes library logs to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A spawner that only stores dispatched futures, so tests decide when they
/// run.
#[derive(Clone, Default)]
pub struct StepSpawner {
    spawned: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
}

impl StepSpawner {
    /// Number of dispatched futures not yet run.
    pub fn queued(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    /// Runs the oldest dispatched future to completion. Returns `false` if
    /// nothing was dispatched.
    pub fn step(&self) -> bool {
        let next = {
            let mut spawned = self.spawned.lock().unwrap();
            if spawned.is_empty() {
                return false;
            }
            spawned.remove(0)
        };

        futures::executor::block_on(next);
        true
    }
}

impl Spawner for StepSpawner {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        self.spawned.lock().unwrap().push(future);
    }
}

/// A spawner that drops every future it is given.
pub struct DiscardSpawner;

impl Spawner for DiscardSpawner {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        drop(future);
    }
}

/// A spawner that keeps the first future it is given and drops every later
/// one, so a test can hold a task in flight and then abandon it.
#[derive(Clone, Default)]
pub struct HoldFirstSpawner {
    held: Arc<Mutex<Option<BoxFuture<'static, ()>>>>,
    seen_first: Arc<Mutex<bool>>,
}

impl HoldFirstSpawner {
    /// Drops the held future without running it. Returns `false` if nothing
    /// is held.
    pub fn abandon(&self) -> bool {
        let held = self.held.lock().unwrap().take();
        held.is_some()
    }
}

impl Spawner for HoldFirstSpawner {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        let keep = {
            let mut seen_first = self.seen_first.lock().unwrap();
            !std::mem::replace(&mut *seen_first, true)
        };

        if keep {
            *self.held.lock().unwrap() = Some(future);
        } else {
            drop(future);
        }
    }
}
