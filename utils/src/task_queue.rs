use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::warn;
use tokio::sync::mpsc;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Single-consumer background task queue with cooperative cancellation.
///
/// Tasks run in submission order on one dedicated thread. Cancellation is
/// checked between tasks only: a task that is already running when
/// `cancel_and_join` is called is allowed to finish before the join returns.
pub struct TaskQueue {
    sender: Option<mpsc::UnboundedSender<Task>>,
    cancelled: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl TaskQueue {
    /// Spawns the worker thread. `name` shows up in thread listings.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn a thread.
    pub fn new(name: &str) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();
        let cancelled = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&cancelled);
        let worker = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                while let Some(task) = receiver.blocking_recv() {
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    task();
                }
            })
            .expect("failed to spawn task queue worker thread");

        Self {
            sender: Some(sender),
            cancelled,
            worker: Some(worker),
        }
    }

    /// Enqueues a task. Tasks submitted after cancellation are dropped.
    pub fn push<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }
        if let Some(sender) = &self.sender
            && sender.send(Box::new(task)).is_err()
        {
            warn!("task queue worker is gone, dropping task");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Requests cancellation and blocks until the worker thread exits.
    ///
    /// Queued tasks that have not started are discarded. Safe to call more
    /// than once.
    pub fn cancel_and_join(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        // Closing the channel wakes a blocked `blocking_recv`.
        self.sender = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("task queue worker thread panicked");
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.cancel_and_join();
    }
}
