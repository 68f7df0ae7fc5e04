//! Units of work shared by the scheduler and the worker pool.

use std::cmp::Ordering;
use std::fmt;

/// Priority of a queued task. Higher priorities are executed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TaskPriority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

/// An opaque unit of work with an ordering priority.
///
/// A task is owned exclusively by whichever queue currently holds it and is
/// consumed by `run()`. Tasks are transferred, never shared, between the
/// scheduler and the worker pool.
pub struct Task {
    priority: TaskPriority,
    job: Box<dyn FnOnce() + Send>,
}

impl Task {
    /// Create a task wrapping a closure.
    pub fn new(priority: TaskPriority, job: impl FnOnce() + Send + 'static) -> Self {
        Self {
            priority,
            job: Box::new(job),
        }
    }

    /// The priority this task was submitted with.
    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Execute the task, consuming it.
    pub fn run(self) {
        (self.job)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Heap entry pairing a task with its enqueue sequence number.
///
/// Ordering is by priority first, then FIFO among equal priorities (lower
/// sequence numbers sort higher in the max-heap).
pub(crate) struct QueuedTask {
    pub(crate) seq: u64,
    pub(crate) task: Task,
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.task.priority() == other.task.priority() && self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task
            .priority()
            .cmp(&other.task.priority())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(TaskPriority::Highest > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Normal);
        assert!(TaskPriority::Normal > TaskPriority::Low);
        assert!(TaskPriority::Low > TaskPriority::Lowest);
        assert_eq!(TaskPriority::default(), TaskPriority::Normal);
    }

    #[test]
    fn test_queued_task_ordering() {
        let high = QueuedTask {
            seq: 5,
            task: Task::new(TaskPriority::High, || {}),
        };
        let normal_early = QueuedTask {
            seq: 1,
            task: Task::new(TaskPriority::Normal, || {}),
        };
        let normal_late = QueuedTask {
            seq: 2,
            task: Task::new(TaskPriority::Normal, || {}),
        };

        // Higher priority sorts first regardless of submission order.
        assert!(high > normal_early);
        // Equal priority is FIFO: the earlier submission sorts first.
        assert!(normal_early > normal_late);
    }
}
