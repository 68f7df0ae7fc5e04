//! Fixed-size worker thread pool over a shared priority queue.

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crate::task::{QueuedTask, Task, TaskPriority};

/// A fixed set of threads pulling from a shared priority task queue.
///
/// Workers sleep while the queue is empty or the pool is paused and are woken
/// by [`schedule`]/[`resume`]. Dropping the pool joins every worker; tasks
/// still queued at that point are discarded without running; do not rely on
/// pending tasks completing across shutdown.
///
/// [`schedule`]: WorkerPool::schedule
/// [`resume`]: WorkerPool::resume
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    threads: Vec<thread::JoinHandle<()>>,
}

struct PoolShared {
    queue: Mutex<BinaryHeap<QueuedTask>>,
    available: Condvar,
    paused: AtomicBool,
    shutdown: AtomicBool,
    /// Tasks queued or currently running.
    outstanding: AtomicUsize,
    seq: AtomicU64,
}

impl WorkerPool {
    /// Create a pool with the given number of worker threads, clamped to at
    /// least one.
    pub fn new(threads: usize) -> Self {
        let count = threads.max(1);
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(BinaryHeap::new()),
            available: Condvar::new(),
            paused: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            outstanding: AtomicUsize::new(0),
            seq: AtomicU64::new(0),
        });

        let mut handles = Vec::with_capacity(count);
        for i in 0..count {
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("kiln-worker-{i}"))
                .spawn(move || worker_main(&shared))
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }

        tracing::debug!(threads = count, "worker pool started");

        Self {
            shared,
            threads: handles,
        }
    }

    /// Create a pool sized for background work, leaving one core for the
    /// frame thread.
    pub fn default_threads() -> Self {
        Self::new(num_cpus::get().max(2) - 1)
    }

    /// Enqueue a closure with the given priority and wake one idle worker.
    pub fn schedule(&self, priority: TaskPriority, job: impl FnOnce() + Send + 'static) {
        self.submit(Task::new(priority, job));
    }

    /// Enqueue an already-constructed task.
    pub fn submit(&self, task: Task) {
        let seq = self.shared.seq.fetch_add(1, Ordering::Relaxed);
        self.shared.outstanding.fetch_add(1, Ordering::AcqRel);
        self.shared
            .queue
            .lock()
            .expect("worker queue poisoned")
            .push(QueuedTask { seq, task });
        self.shared.available.notify_one();
    }

    /// Stop idle workers from picking up queued tasks.
    ///
    /// Tasks that are already running finish normally.
    pub fn pause(&self) {
        let _guard = self.shared.queue.lock().expect("worker queue poisoned");
        self.shared.paused.store(true, Ordering::Release);
    }

    /// Let paused workers pick up queued tasks again.
    pub fn resume(&self) {
        // Flip the flag under the queue lock so no worker can slip between
        // its pause check and the condvar wait.
        let _guard = self.shared.queue.lock().expect("worker queue poisoned");
        self.shared.paused.store(false, Ordering::Release);
        self.shared.available.notify_all();
    }

    /// Whether the pool is currently paused.
    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Yield-poll until every queued and running task has finished.
    ///
    /// Intended for shutdown and flush paths, not steady-state use.
    pub fn wait_all(&self) {
        while self.shared.outstanding.load(Ordering::Acquire) != 0 {
            thread::yield_now();
        }
    }

    /// Number of tasks queued or running.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let _guard = self.shared.queue.lock().expect("worker queue poisoned");
            self.shared.shutdown.store(true, Ordering::Release);
            self.shared.available.notify_all();
        }

        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked during shutdown");
            }
        }

        // Tasks still queued here are dropped without running.
        let dropped = self.shared.queue.lock().expect("worker queue poisoned").len();
        if dropped > 0 {
            tracing::debug!(dropped, "discarded queued tasks at pool shutdown");
        }
    }
}

fn worker_main(shared: &PoolShared) {
    loop {
        let queued = {
            let mut queue = shared.queue.lock().expect("worker queue poisoned");
            loop {
                if shared.shutdown.load(Ordering::Acquire) {
                    return;
                }
                if !shared.paused.load(Ordering::Acquire)
                    && let Some(queued) = queue.pop()
                {
                    break queued;
                }
                queue = shared
                    .available
                    .wait(queue)
                    .expect("worker queue poisoned");
            }
        };

        // Run outside the lock so producers and siblings are never blocked
        // on a task body.
        queued.task.run();
        shared.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}
