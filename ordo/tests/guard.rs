mod common;

use common::init_tracing;
use ordo::{Mutex, MutexState};

use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

#[tokio::test]
async fn test_acquire_on_unheld_resolves_immediately() {
    init_tracing();
    let mutex = Mutex::new();

    let guard = mutex.acquire().now_or_never().expect("lock should be free");
    assert_eq!(mutex.state(), MutexState::HeldNoWaiters);

    drop(guard);
    assert_eq!(mutex.state(), MutexState::Unheld);
}

#[tokio::test]
async fn test_acquire_waits_for_manual_holder() {
    init_tracing();
    let mutex = Mutex::new();
    mutex.lock(|| {});

    let mut acquire = mutex.acquire();
    assert!((&mut acquire).now_or_never().is_none());
    assert_eq!(mutex.waiters(), 1);

    mutex.unlock();

    let guard = acquire.await;
    assert_eq!(mutex.state(), MutexState::HeldNoWaiters);

    guard.release();
    assert_eq!(mutex.state(), MutexState::Unheld);
}

#[tokio::test]
async fn test_guard_release_hands_off_to_queued_section() {
    init_tracing();
    let mutex = Mutex::new();
    let ran = Arc::new(AtomicUsize::new(0));

    let guard = mutex.acquire().await;

    let counter = ran.clone();
    mutex.lock(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    drop(guard);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(mutex.state(), MutexState::HeldNoWaiters);
}

#[tokio::test]
async fn test_fifo_position_is_fixed_at_call_time() {
    init_tracing();
    let mutex = Mutex::new();
    let order = Arc::new(StdMutex::new(Vec::new()));

    mutex.lock(|| {});

    let first = mutex.acquire();
    let second = mutex.acquire();

    let log = order.clone();
    let third = tokio::spawn(async move {
        let _guard = second.await;
        log.lock().unwrap().push("second");
    });

    let log = order.clone();
    let fourth = tokio::spawn(async move {
        let _guard = first.await;
        log.lock().unwrap().push("first");
    });

    mutex.unlock();
    fourth.await.unwrap();
    third.await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(mutex.state(), MutexState::Unheld);
}

#[tokio::test]
async fn test_dropped_acquire_passes_the_lock_on() {
    init_tracing();
    let mutex = Mutex::new();
    mutex.lock(|| {});

    let abandoned = mutex.acquire();
    let next = mutex.acquire();

    // Granted while nobody is polling it.
    mutex.unlock();
    assert_eq!(mutex.waiters(), 1);

    drop(abandoned);

    let guard = next.await;
    assert_eq!(mutex.state(), MutexState::HeldNoWaiters);
    drop(guard);
    assert_eq!(mutex.state(), MutexState::Unheld);
}

#[tokio::test]
async fn test_acquire_dropped_before_grant_is_skipped() {
    init_tracing();
    let mutex = Mutex::new();
    mutex.lock(|| {});

    drop(mutex.acquire());
    assert_eq!(mutex.waiters(), 1);

    // The abandoned request runs, finds nobody waiting and releases.
    mutex.unlock();
    assert_eq!(mutex.state(), MutexState::Unheld);
}

#[test]
#[should_panic(expected = "polled after completion")]
fn test_acquire_polled_after_completion_panics() {
    let mutex = Mutex::new();
    let mut acquire = mutex.acquire();

    let _guard = (&mut acquire).now_or_never().expect("lock should be free");
    let _ = (&mut acquire).now_or_never();
}

#[test]
fn test_repolled_acquire_leaves_the_lock_with_its_guard() {
    let mutex = Mutex::new();
    let mut acquire = mutex.acquire();
    let guard = (&mut acquire).now_or_never().expect("lock should be free");

    let repoll = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = (&mut acquire).now_or_never();
    }));
    assert!(repoll.is_err());

    // The only guard is still the one that was handed out.
    assert_eq!(mutex.state(), MutexState::HeldNoWaiters);
    drop(acquire);
    assert_eq!(mutex.state(), MutexState::HeldNoWaiters);

    drop(guard);
    assert_eq!(mutex.state(), MutexState::Unheld);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_guards_serialize_concurrent_tasks() {
    init_tracing();
    let mutex = Mutex::new();
    let running = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let total = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let mutex = mutex.clone();
        let running = running.clone();
        let overlaps = overlaps.clone();
        let total = total.clone();

        handles.push(tokio::spawn(async move {
            let _guard = mutex.acquire().await;
            if running.fetch_add(1, Ordering::SeqCst) != 0 {
                overlaps.fetch_add(1, Ordering::SeqCst);
            }
            tokio::task::yield_now().await;
            total.fetch_add(1, Ordering::SeqCst);
            running.fetch_sub(1, Ordering::SeqCst);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(total.load(Ordering::SeqCst), 50);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(mutex.state(), MutexState::Unheld);
}
