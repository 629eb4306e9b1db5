use workpool_api::PoolError;

pub const DEFAULT_THREAD_NAME_PREFIX: &str = "workpool-worker";

/// Configuration for a [`WorkerPool`](super::WorkerPool).
#[derive(Clone, Debug)]
pub struct WorkerPoolConfig {
    /// The number of worker threads. Fixed for the lifetime of the pool.
    pub worker_count: usize,

    /// Worker threads are named `{thread_name_prefix}-{worker_id}`.
    pub thread_name_prefix: String,

    /// Stack size for worker threads, in bytes. `None` keeps the platform default.
    pub stack_size: Option<usize>,

    /// Whether a panicking task is caught and reported as a failure.
    /// When disabled, a panic unwinds through the worker and terminates it.
    pub catch_panics: bool,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            stack_size: None,
            catch_panics: true,
        }
    }
}

impl WorkerPoolConfig {
    /// Default configuration with an explicit worker count.
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// Check the configuration before any thread is started.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.worker_count == 0 {
            return Err(PoolError::InvalidConfiguration(
                "worker count must be positive".to_string(),
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(PoolError::InvalidConfiguration(
                "thread name prefix must not be empty".to_string(),
            ));
        }
        if self.stack_size == Some(0) {
            return Err(PoolError::InvalidConfiguration(
                "stack size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn thread_name(&self, worker_id: usize) -> String {
        format!("{}-{}", self.thread_name_prefix, worker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_rejected() {
        let err = WorkerPoolConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfiguration(_)));
        assert_eq!(err.to_string(), "Invalid configuration: worker count must be positive");
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = WorkerPoolConfig::new(2).with_thread_name_prefix("");
        assert!(matches!(config.validate(), Err(PoolError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_zero_stack_rejected() {
        let config = WorkerPoolConfig::new(2).with_stack_size(0);
        assert!(matches!(config.validate(), Err(PoolError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_thread_name() {
        let config = WorkerPoolConfig::new(1).with_thread_name_prefix("io");
        assert_eq!(config.thread_name(3), "io-3");
    }
}
