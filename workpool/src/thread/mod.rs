#![doc = " Thread-based worker pool implementation for workpool."]

pub mod config;
mod handoff;
pub mod pool;
pub mod reporter;
mod worker;

// Re-export key types for easier usage
pub use config::WorkerPoolConfig;
pub use pool::{PoolMetrics, WorkerPool, WorkerPoolBuilder};
pub use reporter::TracingReporter;
