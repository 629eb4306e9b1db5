//! # Task Pool Contract
//!
//! A task pool owns a fixed number of workers and hands submitted tasks to
//! them through a rendezvous: submission completes only once a worker has
//! accepted the task.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──> Running ──close()──> Closing ──> Closed
//! ```
//!
//! Transitions never go backwards. `Created` only exists while workers are
//! being started and behaves exactly like `Running`.
//!
//! ## Guarantees
//!
//! - A task accepted by `submit` runs exactly once, before `close` returns.
//! - A task rejected with [`PoolError::PoolClosed`] never runs.
//! - `close` may be called any number of times; calls after the first one
//!   only wait for the drain to finish.

use futures::future::BoxFuture;

use crate::errors::PoolError;
use crate::task::BoxedTask;

/// Lifecycle status of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolStatus {
    /// Workers are being started.
    Created = 0,

    /// Accepting and executing tasks.
    Running = 1,

    /// Shutdown signalled; new submissions are rejected and workers are
    /// finishing their current task.
    Closing = 2,

    /// Every worker has exited.
    Closed = 3,
}

impl PoolStatus {
    /// Decode a status stored as an integer, as done by pools that keep their
    /// status in an atomic.
    pub fn from_usize(value: usize) -> Option<Self> {
        match value {
            0 => Some(PoolStatus::Created),
            1 => Some(PoolStatus::Running),
            2 => Some(PoolStatus::Closing),
            3 => Some(PoolStatus::Closed),
            _ => None,
        }
    }

    /// Whether a pool in this status accepts submissions.
    pub fn accepts_tasks(self) -> bool {
        matches!(self, PoolStatus::Created | PoolStatus::Running)
    }
}

/// A fixed-size executor of [`Task`](crate::task::Task)s.
///
/// Implementations must be shareable between submitting threads.
pub trait TaskPool: Send + Sync {
    /// Hand a task to a worker, blocking until one accepts it or the pool
    /// closes.
    fn submit_boxed(&self, task: BoxedTask) -> Result<(), PoolError>;

    /// Hand a task to a worker without blocking the calling thread.
    fn submit_boxed_async(&self, task: BoxedTask) -> BoxFuture<'_, Result<(), PoolError>>;

    /// Stop accepting work and block until every worker has finished.
    fn close(&self);

    /// Number of worker threads, fixed at creation.
    fn worker_count(&self) -> usize;

    /// Current lifecycle status.
    fn status(&self) -> PoolStatus;
}
