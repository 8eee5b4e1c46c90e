use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use utils::task_queue::TaskQueue;

#[test]
fn test_tasks_run_in_order() {
    let queue = TaskQueue::new("test-worker");
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

    for i in 0..8 {
        let log = Arc::clone(&log);
        queue.push(move || log.lock().push(i));
    }

    // Give the worker time to drain; ordering is guaranteed by the single
    // consumer, completion is what we wait for.
    for _ in 0..100 {
        if log.lock().len() == 8 {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(*log.lock(), (0..8).collect::<Vec<_>>());
}

#[test]
fn test_cancel_and_join_discards_pending_tasks() {
    let mut queue = TaskQueue::new("test-worker");
    let ran = Arc::new(AtomicUsize::new(0));

    // A long first task keeps the rest queued while we cancel.
    {
        let ran = Arc::clone(&ran);
        queue.push(move || {
            std::thread::sleep(Duration::from_millis(50));
            ran.fetch_add(1, Ordering::SeqCst);
        });
    }
    for _ in 0..16 {
        let ran = Arc::clone(&ran);
        queue.push(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        });
    }

    queue.cancel_and_join();

    // The in-flight task may finish; everything still queued must not run.
    assert!(ran.load(Ordering::SeqCst) <= 1);
    assert!(queue.is_cancelled());
}

#[test]
fn test_push_after_cancel_is_dropped() {
    let mut queue = TaskQueue::new("test-worker");
    queue.cancel_and_join();

    let ran = Arc::new(AtomicUsize::new(0));
    {
        let ran = Arc::clone(&ran);
        queue.push(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}
