use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use workpool_api::{
    BoxedTask, FailureReporter, PoolStatus, Task, TaskError, TaskFailure, TaskResult,
};

struct CountingTask {
    runs: Arc<AtomicUsize>,
}

impl Task for CountingTask {
    fn run(self: Box<Self>) -> TaskResult {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_closure_is_a_task() {
    let task: BoxedTask = Box::new(|| -> TaskResult { anyhow::bail!("nope") });
    let err = task.run().unwrap_err();
    assert_eq!(err.to_string(), "nope");
}

#[test]
fn test_custom_task_runs_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let task: BoxedTask = Box::new(CountingTask { runs: Arc::clone(&runs) });

    task.run().unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_closure_reporter_receives_failure() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let reporter: Arc<dyn FailureReporter> = Arc::new(move |failure: &TaskFailure| {
        sink.lock().unwrap().push(failure.to_string());
    });

    reporter.report(&TaskFailure {
        worker_id: 2,
        task_seq: 17,
        error: TaskError::Panicked("boom".to_string()),
    });

    assert_eq!(seen.lock().unwrap().as_slice(), ["task #17 on worker 2: Task panicked: boom"]);
}

#[test]
fn test_pool_status_encoding() {
    for status in [
        PoolStatus::Created,
        PoolStatus::Running,
        PoolStatus::Closing,
        PoolStatus::Closed,
    ] {
        assert_eq!(PoolStatus::from_usize(status as usize), Some(status));
    }
    assert_eq!(PoolStatus::from_usize(9), None);
}

#[test]
fn test_only_open_statuses_accept_tasks() {
    assert!(PoolStatus::Created.accepts_tasks());
    assert!(PoolStatus::Running.accepts_tasks());
    assert!(!PoolStatus::Closing.accepts_tasks());
    assert!(!PoolStatus::Closed.accepts_tasks());
}
