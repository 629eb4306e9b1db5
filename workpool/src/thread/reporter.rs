use tracing::error;
use workpool_api::reporter::{FailureReporter, TaskFailure};

/// Default reporter: every task failure becomes an `error` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &TaskFailure) {
        error!(
            worker_id = failure.worker_id,
            task_seq = failure.task_seq,
            error = %failure.error,
            "Task execution failed"
        );
    }
}
