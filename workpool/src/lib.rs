// Workpool
//
// A fixed-size pool of worker threads that execute submitted tasks, with
// blocking hand-off on submission and wait-for-completion shutdown.

pub mod logging;
pub mod thread;

// Re-export commonly used types
pub use thread::{PoolMetrics, TracingReporter, WorkerPool, WorkerPoolBuilder, WorkerPoolConfig};
pub use workpool_api::{
    BoxedTask, FailureReporter, PoolError, PoolStatus, Task, TaskError, TaskFailure, TaskPool,
    TaskResult,
};
