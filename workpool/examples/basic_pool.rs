use std::thread;
use std::time::{Duration, Instant};

use workpool::{logging, TaskResult, WorkerPool};

fn main() -> anyhow::Result<()> {
    logging::init_development();

    let worker_count = 5;
    let pool = WorkerPool::new(worker_count)?;

    // Ten one-second tasks on five workers: two waves.
    let start = Instant::now();
    for i in 0..10 {
        pool.submit(move || -> TaskResult {
            println!("Executing task {i}");
            thread::sleep(Duration::from_secs(1));
            Ok(())
        })?;
    }

    println!("All tasks submitted. Closing the worker pool.");
    pool.close();

    let metrics = pool.metrics();
    println!(
        "Closed after {:?}: {} tasks completed, {} failed",
        start.elapsed(),
        metrics.tasks_completed,
        metrics.tasks_failed
    );
    Ok(())
}
