//! # Pool Error Types
//!
//! Two families of errors exist and they never mix:
//!
//! - [`PoolError`] is returned synchronously to whoever called a pool operation
//!   (creation or submission).
//! - [`TaskError`] describes a task that ran and failed. It stays on the worker
//!   that ran the task and is only visible through a
//!   [`FailureReporter`](crate::reporter::FailureReporter).
//!
//! ## Usage Example
//!
//! ```rust
//! use workpool_api::errors::PoolError;
//!
//! fn describe(error: &PoolError) -> &'static str {
//!     match error {
//!         PoolError::InvalidConfiguration(_) => "fix the pool settings",
//!         PoolError::PoolClosed => "the pool no longer accepts work",
//!         PoolError::WorkerSpawn(_) => "the OS refused a worker thread",
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors returned by pool operations.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The pool was asked to start with settings it cannot honour,
    /// such as zero workers. No worker thread was started.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The pool is closing or closed. The submitted task was not executed.
    #[error("Worker pool is closed")]
    PoolClosed,

    /// A worker thread could not be spawned. Workers already started were
    /// shut down before this error was returned.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

impl PoolError {
    /// Whether this error means the pool has stopped accepting work.
    pub fn is_closed(&self) -> bool {
        matches!(self, PoolError::PoolClosed)
    }
}

/// Failure of a single task execution.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task returned an error.
    #[error("Task failed: {0}")]
    Failed(#[source] anyhow::Error),

    /// The task panicked; the payload is rendered as text when possible.
    #[error("Task panicked: {0}")]
    Panicked(String),
}

impl From<anyhow::Error> for TaskError {
    fn from(error: anyhow::Error) -> Self {
        TaskError::Failed(error)
    }
}
