//! Main-thread task queue drained once per frame.

use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::task::{QueuedTask, Task, TaskPriority};

/// A priority-ordered task queue drained synchronously on demand.
///
/// Tasks execute on whichever thread calls [`process_all_tasks`], highest
/// priority first, FIFO among equal priorities. The queue itself may be fed
/// from any thread, but execution is cooperative: nothing runs until the
/// owning thread pumps it.
///
/// [`process_all_tasks`]: Scheduler::process_all_tasks
#[derive(Default)]
pub struct Scheduler {
    queue: Mutex<BinaryHeap<QueuedTask>>,
    seq: AtomicU64,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a closure with the given priority.
    pub fn schedule(&self, priority: TaskPriority, job: impl FnOnce() + Send + 'static) {
        self.submit(Task::new(priority, job));
    }

    /// Enqueue an already-constructed task.
    pub fn submit(&self, task: Task) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.queue
            .lock()
            .expect("scheduler queue poisoned")
            .push(QueuedTask { seq, task });
    }

    /// Drain the queue to empty, executing every task on the calling thread.
    ///
    /// Tasks enqueued by a running task are drained in the same call; the
    /// loop only stops once the queue is observably empty. A panicking task
    /// propagates to the caller; submitters that need failure isolation
    /// wrap their work in a promise-settling closure instead. Returns the
    /// number of tasks executed.
    pub fn process_all_tasks(&self) -> usize {
        let mut processed = 0;
        loop {
            // Pop one task at a time so a running task can schedule more.
            let next = self
                .queue
                .lock()
                .expect("scheduler queue poisoned")
                .pop();
            match next {
                Some(queued) => {
                    queued.task.run();
                    processed += 1;
                }
                None => break,
            }
        }
        processed
    }

    /// Number of tasks currently queued.
    pub fn len(&self) -> usize {
        self.queue.lock().expect("scheduler queue poisoned").len()
    }

    /// Check whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
