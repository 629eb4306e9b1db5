//! # Task Definition
//!
//! A task is the unit of work a pool executes. It takes no arguments, runs
//! exactly once and reports success or failure through [`TaskResult`].
//!
//! Any `FnOnce() -> TaskResult` closure that is `Send + 'static` is a task, so
//! most callers never implement the trait by hand:
//!
//! ```rust
//! use workpool_api::task::{BoxedTask, Task};
//!
//! let task: BoxedTask = Box::new(|| {
//!     anyhow::ensure!(1 + 1 == 2, "arithmetic is broken");
//!     Ok(())
//! });
//! assert!(task.run().is_ok());
//! ```

/// Outcome reported by a task.
pub type TaskResult = anyhow::Result<()>;

/// Type-erased task, as carried by a pool's work queue.
pub type BoxedTask = Box<dyn Task>;

/// A unit of work that can be handed to a pool.
///
/// `run` consumes the task: once a worker has executed it, nothing owns it
/// anymore.
pub trait Task: Send + 'static {
    /// Execute the task on the current thread.
    fn run(self: Box<Self>) -> TaskResult;
}

impl<F> Task for F
where
    F: FnOnce() -> TaskResult + Send + 'static,
{
    fn run(self: Box<Self>) -> TaskResult {
        (*self)()
    }
}
