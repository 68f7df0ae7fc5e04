//! Kiln Core
//!
//! Execution primitives underneath the kiln asset pipeline:
//!
//! - [`Scheduler`]: a priority task queue drained cooperatively on the frame
//!   thread.
//! - [`WorkerPool`]: a fixed set of background threads over a shared
//!   priority queue, with pause/resume and a blocking drain.
//! - [`Deferrer`]: "run this on a worker" / "run this on the frame thread
//!   next tick" as promise-returning submissions.
//! - [`Promise`]: a single-assignment asynchronous value with chained
//!   continuations, rejection propagation, and aggregation.

pub mod deferrer;
pub mod logging;
pub mod promise;
pub mod scheduler;
pub mod task;
pub mod worker_pool;

pub use deferrer::Deferrer;
pub use promise::{Promise, all, join2, join3};
pub use scheduler::Scheduler;
pub use task::{Task, TaskPriority};
pub use worker_pool::WorkerPool;
