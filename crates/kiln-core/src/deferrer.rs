//! Promise-returning submission onto worker threads and the frame thread.

use crate::promise::Promise;
use crate::scheduler::Scheduler;
use crate::task::TaskPriority;
use crate::worker_pool::WorkerPool;

/// Composes one [`WorkerPool`] and one [`Scheduler`] behind two asynchronous
/// submission primitives.
///
/// [`do_in_worker_thread`] resolves its promise from a pool thread as soon as
/// a worker runs the closure. [`do_in_main_thread`] resolves only when the
/// owning thread next calls [`frame_tick`]; if the host never pumps, those
/// promises stay pending forever; that is the documented contract, not a bug.
///
/// [`do_in_worker_thread`]: Deferrer::do_in_worker_thread
/// [`do_in_main_thread`]: Deferrer::do_in_main_thread
/// [`frame_tick`]: Deferrer::frame_tick
pub struct Deferrer {
    pool: WorkerPool,
    scheduler: Scheduler,
}

impl Deferrer {
    /// Create a deferrer with a background pool sized
    /// `max(2, available cores) - 1`.
    pub fn new() -> Self {
        Self::with_worker_threads(num_cpus::get().max(2) - 1)
    }

    /// Create a deferrer with an explicit worker thread count.
    pub fn with_worker_threads(threads: usize) -> Self {
        Self {
            pool: WorkerPool::new(threads),
            scheduler: Scheduler::new(),
        }
    }

    /// Run a fallible closure on a worker thread at normal priority.
    pub fn do_in_worker_thread<T, E, F>(&self, f: F) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.do_in_worker_thread_at(TaskPriority::Normal, f)
    }

    /// Run a fallible closure on a worker thread at the given priority.
    ///
    /// An `Err` return rejects the promise instead of escaping into the
    /// worker.
    pub fn do_in_worker_thread_at<T, E, F>(&self, priority: TaskPriority, f: F) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let promise = Promise::pending();
        let settle = promise.clone();
        self.pool.schedule(priority, move || match f() {
            Ok(value) => settle.fulfill(value),
            Err(error) => settle.reject(error),
        });
        promise
    }

    /// Run a fallible closure on the frame thread at normal priority, during
    /// the next [`frame_tick`].
    ///
    /// [`frame_tick`]: Deferrer::frame_tick
    pub fn do_in_main_thread<T, E, F>(&self, f: F) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.do_in_main_thread_at(TaskPriority::Normal, f)
    }

    /// Run a fallible closure on the frame thread at the given priority.
    pub fn do_in_main_thread_at<T, E, F>(&self, priority: TaskPriority, f: F) -> Promise<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let promise = Promise::pending();
        let settle = promise.clone();
        self.scheduler.schedule(priority, move || match f() {
            Ok(value) => settle.fulfill(value),
            Err(error) => settle.reject(error),
        });
        promise
    }

    /// Pump the frame-thread queue, draining it to empty on the calling
    /// thread. Returns the number of tasks executed.
    ///
    /// The host loop must call this regularly; it is the sole pump for
    /// main-thread continuations.
    pub fn frame_tick(&self) -> usize {
        self.scheduler.process_all_tasks()
    }

    /// The background worker pool.
    pub fn worker_pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// The frame-thread scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl Default for Deferrer {
    fn default() -> Self {
        Self::new()
    }
}
