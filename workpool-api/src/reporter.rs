//! # Task Failure Reporting
//!
//! A pool never hands task failures back to the submitter. Instead, every
//! failed execution is described by a [`TaskFailure`] and passed to the pool's
//! [`FailureReporter`]. Reporters are called on the worker thread that ran the
//! task, right after the task returned, so they should be quick.
//!
//! Plain closures are reporters:
//!
//! ```rust
//! use std::sync::Arc;
//! use workpool_api::reporter::{FailureReporter, TaskFailure};
//!
//! let reporter: Arc<dyn FailureReporter> = Arc::new(|failure: &TaskFailure| {
//!     eprintln!("worker {} failed: {}", failure.worker_id, failure.error);
//! });
//! # let _ = reporter;
//! ```

use std::fmt;

use crate::errors::TaskError;

/// Description of a task execution that did not succeed.
#[derive(Debug)]
pub struct TaskFailure {
    /// Index of the worker thread that ran the task.
    pub worker_id: usize,

    /// Per-pool sequence number of the task, in acceptance order.
    pub task_seq: u64,

    /// What went wrong.
    pub error: TaskError,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task #{} on worker {}: {}",
            self.task_seq, self.worker_id, self.error
        )
    }
}

/// Receiver of task failures.
pub trait FailureReporter: Send + Sync {
    /// Called once for every failed task execution.
    fn report(&self, failure: &TaskFailure);
}

impl<F> FailureReporter for F
where
    F: Fn(&TaskFailure) + Send + Sync,
{
    fn report(&self, failure: &TaskFailure) {
        self(failure)
    }
}
