//! Worker pool for the asynchronous entry points.
//!
//! Jobs are owned closures, queued FIFO and completed through a one-shot
//! channel exactly once. Shutdown is cooperative: a flag plus a broadcast
//! wake lets every worker finish the task in hand, stop accepting new ones
//! and join. Jobs still queued at shutdown — and submissions made after
//! it — resolve their completion port as closed, which the engine reports
//! as a threading error.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker-thread id counter, for thread naming.
static WORKER_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    available: Condvar,
    shutdown: AtomicBool,
}

/// Fixed-size worker pool with one-shot job completion.
pub struct AsyncExecutor {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for AsyncExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncExecutor {
    /// Pool sized to the logical core count, at least one worker.
    pub fn new() -> Self {
        Self::with_threads(default_worker_count())
    }

    pub fn with_threads(count: usize) -> Self {
        let count = count.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let workers = (0..count)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let id = WORKER_COUNTER.fetch_add(1, Ordering::Relaxed);
                std::thread::Builder::new()
                    .name(format!("textsim-worker-{id}"))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn similarity worker thread")
            })
            .collect();

        debug!(worker_threads = count, "async executor started");

        Self {
            shared,
            workers: Mutex::new(workers),
        }
    }

    /// Hand over an owned computation. The returned receiver yields the
    /// result exactly once; it resolves as closed if the executor shuts
    /// down before the job runs.
    pub fn submit<T, F>(&self, work: F) -> oneshot::Receiver<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        {
            let mut queue = self.shared.queue.lock();
            if self.shared.shutdown.load(Ordering::Acquire) {
                // Sender drops here; the receiver observes a closed port.
                return receiver;
            }
            queue.push_back(Box::new(move || {
                let _ = sender.send(work());
            }));
        }
        self.shared.available.notify_one();

        receiver
    }

    /// True once shutdown has begun.
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    /// Stop accepting work, wake every worker, and join them. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        // Take the lock once so no worker can miss the flag between its
        // check and its wait.
        drop(self.shared.queue.lock());
        self.shared.available.notify_all();

        let workers: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        let joined = workers.len();
        for worker in workers {
            let _ = worker.join();
        }

        // Unclaimed jobs drop with their completion senders.
        let dropped = {
            let mut queue = self.shared.queue.lock();
            let dropped = queue.len();
            queue.clear();
            dropped
        };

        debug!(joined, dropped, "async executor shut down");
    }
}

impl Drop for AsyncExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            loop {
                if shared.shutdown.load(Ordering::Acquire) {
                    return;
                }
                if let Some(job) = queue.pop_front() {
                    break job;
                }
                shared.available.wait(&mut queue);
            }
        };

        job();
    }
}

/// Logical core count, clamped to at least one.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1)
}
