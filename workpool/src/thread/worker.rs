//! # Worker Thread Module
//!
//! Each worker is a long-lived OS thread that repeatedly takes a task from the
//! pool's hand-off queue and runs it to completion.
//!
//! ## Core Algorithm
//! 1. Wait until a submission is offered or the queue closes
//! 2. On a task: run it synchronously, report a failure if there is one
//! 3. On a closed, empty queue: leave the loop and let the thread end
//!
//! A running task is never interrupted. Closing is only looked at between
//! tasks, so a worker always finishes what it accepted.
//!
//! ## Failure Isolation
//! Task errors and (by default) task panics are turned into a [`TaskFailure`]
//! and passed to the pool's [`FailureReporter`]. A reporter that panics is
//! contained as well. The worker then goes back to waiting for work.

use std::any::Any;
use std::cell::Cell;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, debug_span, error, trace};
use uuid::Uuid;
use workpool_api::reporter::{FailureReporter, TaskFailure};
use workpool_api::{BoxedTask, Task, TaskError};

use super::config::WorkerPoolConfig;
use super::handoff::HandOff;

thread_local! {
    static CURRENT_POOL: Cell<Option<Uuid>> = const { Cell::new(None) };
}

/// Id of the pool the current thread works for, if it is a worker thread.
pub(crate) fn current_pool() -> Option<Uuid> {
    CURRENT_POOL.with(Cell::get)
}

/// State shared between a pool and all of its workers.
pub(crate) struct PoolShared {
    pub pool_id: Uuid,
    pub reporter: Arc<dyn FailureReporter>,
    pub catch_panics: bool,

    /// Worker threads that have been started and not yet exited.
    pub active_workers: AtomicUsize,

    /// Workers currently running a task.
    pub busy_workers: AtomicUsize,

    /// Tasks accepted by a worker. Also the source of task sequence numbers.
    pub tasks_accepted: AtomicU64,

    /// Tasks whose execution has ended, successfully or not.
    pub tasks_completed: AtomicU64,

    pub tasks_failed: AtomicU64,
}

impl PoolShared {
    pub fn new(pool_id: Uuid, reporter: Arc<dyn FailureReporter>, catch_panics: bool) -> Self {
        Self {
            pool_id,
            reporter,
            catch_panics,
            active_workers: AtomicUsize::new(0),
            busy_workers: AtomicUsize::new(0),
            tasks_accepted: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
        }
    }
}

/// Decrements a counter when dropped, including while unwinding.
struct Decrement<'a>(&'a AtomicUsize);

impl Drop for Decrement<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) struct Worker {
    id: usize,
    handoff: Arc<HandOff>,
    shared: Arc<PoolShared>,
}

impl Worker {
    pub fn new(id: usize, handoff: Arc<HandOff>, shared: Arc<PoolShared>) -> Self {
        Self { id, handoff, shared }
    }

    /// Start the worker on a new OS thread.
    ///
    /// The caller owns the active-worker increment: it must only count the
    /// worker once this returns `Ok`. The thread decrements it on exit.
    pub fn spawn(self, config: &WorkerPoolConfig) -> io::Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new().name(config.thread_name(self.id));
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder.spawn(move || self.run())
    }

    fn run(self) {
        let shared = Arc::clone(&self.shared);
        let _active = Decrement(&shared.active_workers);
        CURRENT_POOL.with(|pool| pool.set(Some(shared.pool_id)));

        let span = debug_span!("worker", pool_id = %shared.pool_id, worker_id = self.id);
        let _enter = span.enter();
        debug!("Worker started");

        while let Some(task) = self.handoff.take() {
            self.execute(task);
        }

        debug!("Hand-off queue closed; exiting");
    }

    fn execute(&self, task: BoxedTask) {
        let shared = &self.shared;
        let task_seq = shared.tasks_accepted.fetch_add(1, Ordering::SeqCst);
        shared.busy_workers.fetch_add(1, Ordering::SeqCst);
        trace!(task_seq, "Executing task");

        let outcome = {
            let _busy = Decrement(&shared.busy_workers);
            if shared.catch_panics {
                match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
                    Ok(result) => result.map_err(TaskError::Failed),
                    Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
                }
            } else {
                task.run().map_err(TaskError::Failed)
            }
        };

        shared.tasks_completed.fetch_add(1, Ordering::SeqCst);
        if let Err(error) = outcome {
            shared.tasks_failed.fetch_add(1, Ordering::SeqCst);
            let failure = TaskFailure {
                worker_id: self.id,
                task_seq,
                error,
            };
            if panic::catch_unwind(AssertUnwindSafe(|| shared.reporter.report(&failure))).is_err() {
                error!(task_seq, "Failure reporter panicked");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use workpool_api::TaskResult;

    fn shared_with_log() -> (Arc<PoolShared>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let reporter = move |failure: &TaskFailure| {
            sink.lock().unwrap().push(failure.error.to_string());
        };
        let shared = Arc::new(PoolShared::new(Uuid::new_v4(), Arc::new(reporter), true));
        (shared, log)
    }

    fn worker(shared: &Arc<PoolShared>) -> Worker {
        Worker::new(7, Arc::new(HandOff::new()), Arc::clone(shared))
    }

    #[test]
    fn test_execute_success_counts() {
        let (shared, log) = shared_with_log();
        let worker = worker(&shared);

        worker.execute(Box::new(|| -> TaskResult { Ok(()) }));

        assert_eq!(shared.tasks_accepted.load(Ordering::SeqCst), 1);
        assert_eq!(shared.tasks_completed.load(Ordering::SeqCst), 1);
        assert_eq!(shared.tasks_failed.load(Ordering::SeqCst), 0);
        assert_eq!(shared.busy_workers.load(Ordering::SeqCst), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_execute_reports_error() {
        let (shared, log) = shared_with_log();
        let worker = worker(&shared);

        worker.execute(Box::new(|| -> TaskResult { Err(anyhow::anyhow!("disk full")) }));

        assert_eq!(shared.tasks_failed.load(Ordering::SeqCst), 1);
        assert_eq!(log.lock().unwrap().as_slice(), ["Task failed: disk full"]);
    }

    #[test]
    fn test_execute_catches_panic() {
        let (shared, log) = shared_with_log();
        let worker = worker(&shared);

        worker.execute(Box::new(|| -> TaskResult { panic!("boom") }));

        assert_eq!(shared.tasks_completed.load(Ordering::SeqCst), 1);
        assert_eq!(shared.busy_workers.load(Ordering::SeqCst), 0);
        assert_eq!(log.lock().unwrap().as_slice(), ["Task panicked: boom"]);
    }

    #[test]
    fn test_panicking_reporter_does_not_stop_worker() {
        fn broken_reporter(_: &TaskFailure) {
            panic!("reporter is broken");
        }
        let shared = Arc::new(PoolShared::new(Uuid::new_v4(), Arc::new(broken_reporter), true));
        let worker = worker(&shared);

        worker.execute(Box::new(|| -> TaskResult { Err(anyhow::anyhow!("first")) }));
        worker.execute(Box::new(|| -> TaskResult { Ok(()) }));

        assert_eq!(shared.tasks_completed.load(Ordering::SeqCst), 2);
        assert_eq!(shared.tasks_failed.load(Ordering::SeqCst), 1);
        assert_eq!(shared.busy_workers.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_run_exits_when_queue_closes() {
        let (shared, _log) = shared_with_log();
        let handoff = Arc::new(HandOff::new());
        shared.active_workers.fetch_add(1, Ordering::SeqCst);

        let worker = Worker::new(0, Arc::clone(&handoff), Arc::clone(&shared));
        let handle = worker.spawn(&WorkerPoolConfig::new(1)).unwrap();
        handoff.close();
        handle.join().unwrap();

        assert_eq!(shared.active_workers.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "Unknown panic");
    }
}
