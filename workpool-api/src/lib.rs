//! # Workpool API
//!
//! Contracts shared by every workpool executor: what a unit of work looks like,
//! how a pool reports task failures, and the errors pool operations return.
//!
//! ## Core Components
//!
//! - **Task**: a zero-argument unit of work that reports success or failure
//! - **TaskPool**: a fixed-size executor that accepts tasks and shuts down gracefully
//! - **FailureReporter**: side channel that receives failures of tasks the pool ran
//! - **Errors**: `PoolError` for pool operations, `TaskError` for task outcomes
//!
//! ## Usage Example
//!
//! ```rust
//! use workpool_api::{Task, TaskResult};
//!
//! fn job() -> impl Task {
//!     || -> TaskResult {
//!         println!("working");
//!         Ok(())
//!     }
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`task`]: Task trait and boxed task alias
//! - [`pool`]: Pool trait and lifecycle status
//! - [`reporter`]: Task failure reporting
//! - [`errors`]: Error types

pub mod errors;
pub mod pool;
pub mod reporter;
pub mod task;

pub use errors::{PoolError, TaskError};
pub use pool::{PoolStatus, TaskPool};
pub use reporter::{FailureReporter, TaskFailure};
pub use task::{BoxedTask, Task, TaskResult};
