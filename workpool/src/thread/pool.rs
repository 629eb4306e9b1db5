use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use futures::future::BoxFuture;
use tracing::{error, info, warn};
use uuid::Uuid;
use workpool_api::reporter::FailureReporter;
use workpool_api::{BoxedTask, PoolError, PoolStatus, Task, TaskPool};

use super::config::WorkerPoolConfig;
use super::handoff::HandOff;
use super::reporter::TracingReporter;
use super::worker::{self, PoolShared, Worker};

/// Point-in-time view of a pool's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Number of worker threads the pool was created with
    pub worker_count: usize,

    /// Worker threads that have not exited yet
    pub active_workers: usize,

    /// Workers currently running a task
    pub busy_workers: usize,

    /// Tasks accepted by a worker
    pub tasks_submitted: u64,

    /// Tasks whose execution has ended, including failed ones
    pub tasks_completed: u64,

    /// Tasks that returned an error or panicked
    pub tasks_failed: u64,

    /// Current lifecycle status
    pub status: PoolStatus,
}

/// Fixed-size pool of worker threads fed through a rendezvous queue.
///
/// `WorkerPool` starts all of its workers up front. Submitting a task blocks
/// until an idle worker takes it, which throttles submitters to the speed of
/// the workers instead of buffering work.
///
/// # Thread Safety
/// - The pool is `Send + Sync`; share it between submitters with `Arc`
/// - Acceptance by a worker and rejection by `close` are decided under one
///   lock, so a submission is either run once or refused, never both
///
/// # Shutdown
/// 1. `close` flips the status to `Closing`; new submissions fail from then on
/// 2. The hand-off queue closes, refusing waiting submitters and waking every
///    idle worker
/// 3. Busy workers finish their current task, then see the closed queue
/// 4. `close` joins every worker and marks the pool `Closed`
///
/// A submission that returned `Ok` handed its task to a worker, and workers
/// only exit between tasks, so accepted work is never abandoned.
pub struct WorkerPool {
    id: Uuid,

    worker_count: usize,

    handoff: Arc<HandOff>,

    /// Held for the whole join so that concurrent `close` callers all wait
    /// for the drain.
    workers: Mutex<Vec<JoinHandle<()>>>,

    status: AtomicUsize,

    shared: Arc<PoolShared>,
}

impl WorkerPool {
    /// Create a pool with `worker_count` workers and default settings.
    ///
    /// Fails with [`PoolError::InvalidConfiguration`] when `worker_count` is
    /// zero, in which case no thread is started.
    pub fn new(worker_count: usize) -> Result<Self, PoolError> {
        Self::with_config(WorkerPoolConfig::new(worker_count))
    }

    /// Create a pool from an explicit configuration.
    pub fn with_config(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> WorkerPoolBuilder {
        WorkerPoolBuilder::default()
    }

    fn start(config: WorkerPoolConfig, reporter: Arc<dyn FailureReporter>) -> Result<Self, PoolError> {
        config.validate()?;

        let id = Uuid::new_v4();
        let handoff = Arc::new(HandOff::new());
        let shared = Arc::new(PoolShared::new(id, reporter, config.catch_panics));

        let pool = Self {
            id,
            worker_count: config.worker_count,
            handoff: Arc::clone(&handoff),
            workers: Mutex::new(Vec::with_capacity(config.worker_count)),
            status: AtomicUsize::new(PoolStatus::Created as usize),
            shared: Arc::clone(&shared),
        };

        for worker_id in 0..config.worker_count {
            let worker = Worker::new(worker_id, Arc::clone(&handoff), Arc::clone(&shared));
            match worker.spawn(&config) {
                Ok(handle) => {
                    shared.active_workers.fetch_add(1, Ordering::SeqCst);
                    pool.lock_workers().push(handle);
                }
                Err(err) => {
                    error!(pool_id = %id, worker_id, error = %err, "Failed to spawn worker thread");
                    pool.close();
                    return Err(PoolError::WorkerSpawn(err));
                }
            }
        }

        pool.status.store(PoolStatus::Running as usize, Ordering::SeqCst);
        info!(pool_id = %id, worker_count = config.worker_count, "Worker pool started");

        Ok(pool)
    }

    /// Hand a task to an idle worker.
    ///
    /// Blocks until a worker accepts the task or the pool starts closing.
    /// `Ok` means a worker now owns the task and will run it; the task's own
    /// outcome goes to the pool's failure reporter, never to the submitter.
    pub fn submit<T: Task>(&self, task: T) -> Result<(), PoolError> {
        self.dispatch(Box::new(task))
    }

    /// Async counterpart of [`submit`](Self::submit) that waits for a worker
    /// without blocking the executor thread.
    ///
    /// A pending submission resolves with [`PoolError::PoolClosed`] as soon as
    /// the pool starts closing. Dropping the future before it resolves
    /// withdraws the task unless a worker has already taken it.
    pub async fn submit_async<T: Task>(&self, task: T) -> Result<(), PoolError> {
        self.dispatch_async(Box::new(task)).await
    }

    fn dispatch(&self, task: BoxedTask) -> Result<(), PoolError> {
        if !self.status().accepts_tasks() {
            return Err(PoolError::PoolClosed);
        }

        self.handoff.offer(task)?.wait()
    }

    async fn dispatch_async(&self, task: BoxedTask) -> Result<(), PoolError> {
        if !self.status().accepts_tasks() {
            return Err(PoolError::PoolClosed);
        }

        self.handoff.offer(task)?.wait_async().await
    }

    /// Stop accepting tasks and wait for every worker to finish.
    ///
    /// Safe to call more than once and from several threads; every call
    /// returns only after the pool is drained. Called from one of this
    /// pool's own tasks, it signals shutdown but cannot wait for itself.
    pub fn close(&self) {
        if self.begin_close() {
            info!(pool_id = %self.id, "Closing worker pool");
        }
        self.handoff.close();

        if worker::current_pool() == Some(self.id) {
            warn!(pool_id = %self.id, "Worker pool closed from its own worker thread; not waiting for workers");
            return;
        }

        let mut workers = self.lock_workers();
        let drained = !workers.is_empty();
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                error!(pool_id = %self.id, "Worker thread terminated by a panic");
            }
        }
        self.status.store(PoolStatus::Closed as usize, Ordering::SeqCst);

        if drained {
            info!(
                pool_id = %self.id,
                tasks_completed = self.shared.tasks_completed.load(Ordering::SeqCst),
                tasks_failed = self.shared.tasks_failed.load(Ordering::SeqCst),
                "Worker pool closed"
            );
        }
    }

    /// Move from an accepting status to `Closing`. Returns `true` for the
    /// caller that made the transition.
    fn begin_close(&self) -> bool {
        self.status
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                PoolStatus::from_usize(current)
                    .filter(|status| status.accepts_tasks())
                    .map(|_| PoolStatus::Closing as usize)
            })
            .is_ok()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn active_workers(&self) -> usize {
        self.shared.active_workers.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus::from_usize(self.status.load(Ordering::SeqCst)).unwrap_or(PoolStatus::Closed)
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            worker_count: self.worker_count,
            active_workers: self.active_workers(),
            busy_workers: self.shared.busy_workers.load(Ordering::SeqCst),
            tasks_submitted: self.shared.tasks_accepted.load(Ordering::SeqCst),
            tasks_completed: self.shared.tasks_completed.load(Ordering::SeqCst),
            tasks_failed: self.shared.tasks_failed.load(Ordering::SeqCst),
            status: self.status(),
        }
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("id", &self.id)
            .field("worker_count", &self.worker_count)
            .field("active_workers", &self.active_workers())
            .field("status", &self.status())
            .finish()
    }
}

impl TaskPool for WorkerPool {
    fn submit_boxed(&self, task: BoxedTask) -> Result<(), PoolError> {
        self.dispatch(task)
    }

    fn submit_boxed_async(&self, task: BoxedTask) -> BoxFuture<'_, Result<(), PoolError>> {
        Box::pin(self.dispatch_async(task))
    }

    fn close(&self) {
        WorkerPool::close(self)
    }

    fn worker_count(&self) -> usize {
        self.worker_count
    }

    fn status(&self) -> PoolStatus {
        WorkerPool::status(self)
    }
}

/// Builder for pools that need more than a worker count, such as a custom
/// failure reporter.
///
/// ```rust
/// use workpool::thread::{WorkerPool, WorkerPoolConfig};
/// use workpool_api::TaskFailure;
///
/// let pool = WorkerPool::builder()
///     .config(WorkerPoolConfig::new(2).with_thread_name_prefix("ingest"))
///     .reporter(|failure: &TaskFailure| eprintln!("{failure}"))
///     .build()
///     .unwrap();
/// pool.close();
/// ```
#[derive(Default)]
pub struct WorkerPoolBuilder {
    config: WorkerPoolConfig,
    reporter: Option<Arc<dyn FailureReporter>>,
}

impl WorkerPoolBuilder {
    pub fn config(mut self, config: WorkerPoolConfig) -> Self {
        self.config = config;
        self
    }

    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.config.worker_count = worker_count;
        self
    }

    /// Receiver of task failures. Defaults to [`TracingReporter`].
    pub fn reporter<R: FailureReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    pub fn build(self) -> Result<WorkerPool, PoolError> {
        let reporter = self.reporter.unwrap_or_else(|| Arc::new(TracingReporter));
        WorkerPool::start(self.config, reporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_close_only_once() {
        let pool = WorkerPool::new(1).unwrap();
        assert!(pool.begin_close());
        assert!(!pool.begin_close());
        assert_eq!(pool.status(), PoolStatus::Closing);
        pool.close();
        assert_eq!(pool.status(), PoolStatus::Closed);
    }

    #[test]
    fn test_debug_output() {
        let pool = WorkerPool::new(2).unwrap();
        let debug = format!("{:?}", pool);
        assert!(debug.contains("worker_count: 2"));
        assert!(debug.contains("Running"));
    }

    #[test]
    fn test_metrics_before_any_task() {
        let pool = WorkerPool::new(3).unwrap();
        let metrics = pool.metrics();
        assert_eq!(metrics.worker_count, 3);
        assert_eq!(metrics.active_workers, 3);
        assert_eq!(metrics.tasks_submitted, 0);
        assert_eq!(metrics.status, PoolStatus::Running);
    }
}
