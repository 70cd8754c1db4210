// src/core/scheduler.rs

use std::sync::Arc;

use color_eyre::eyre::eyre;
use tracing::{debug, error, info};

use crate::core::collector::Collector;
use crate::core::probes::Task;

/// Launches every task at once and waits for all of them to finish.
///
/// Each task runs as its own tokio task, so a slow or failing probe never
/// holds up its siblings. There is no timeout: a hung utility hangs the run.
/// A task that panics is recorded as an error under its own name.
///
/// # Arguments
///
/// * `tasks` - The tasks to launch. Each one is consumed by its own tokio task.
/// * `collector` - Shared accumulator every task reports into.
///
/// # Returns
///
/// Nothing; results are read back from `collector` once this resolves.
pub async fn run_all(tasks: Vec<Box<dyn Task>>, collector: Arc<Collector>) {
    let total = tasks.len();
    info!(total, "Launching tasks.");

    let handles: Vec<_> = tasks
        .into_iter()
        .map(|task| {
            let name = task.name().to_string();
            let collector = Arc::clone(&collector);
            let handle = tokio::spawn(async move {
                task.execute(&collector).await;
            });
            (name, handle)
        })
        .collect();

    for (name, handle) in handles {
        match handle.await {
            Ok(()) => debug!(name = %name, "Task finished."),
            Err(e) => {
                error!(name = %name, error = %e, "Task did not complete.");
                collector.record_error(eyre!("task {} panicked: {}", name, e));
            }
        }
    }

    info!(
        total,
        blobs = collector.blob_count(),
        errors = collector.error_count(),
        "All tasks finished."
    );
}
