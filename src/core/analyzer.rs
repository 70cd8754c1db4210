// src/core/analyzer.rs

use std::sync::Arc;

use color_eyre::eyre::{Report, Result};
use tracing::{error, info, warn};

use crate::core::archiver::Archiver;
use crate::core::collector::Collector;
use crate::core::models::Summary;
use crate::core::probes::Task;
use crate::core::registry;
use crate::core::scheduler::run_all;
use crate::settings::Settings;

/// Runs the whole battery against the configured target and writes the archive.
///
/// The archive is opened before anything else so a bad destination is known
/// early, but the probes still run: their failures are logged as they happen
/// even if there is nowhere to store the results.
///
/// # Arguments
///
/// * `settings` - Target host, archive destination and utility names for this run.
///
/// # Returns
///
/// The run's `Summary`, or the error that kept the archive from being opened
/// or closed.
pub async fn run(settings: &Settings) -> Result<Summary> {
    info!(target = %settings.target, archive = %settings.archive_path.display(), "Starting network analysis.");

    let archiver = Archiver::create(&settings.archive_path);
    if let Err(e) = &archiver {
        error!(error = %format!("{e:#}"), "Could not open archive; continuing without it.");
    }

    let collector = Arc::new(Collector::new());
    let tasks = registry::build_tasks(settings, &collector).await;
    collect_and_archive(archiver, tasks, collector).await
}

/// Runs `tasks`, then writes what they produced into `archiver`.
///
/// Every lifecycle step is attempted even if an earlier one failed. The first
/// open or close failure is returned once the run is over.
pub async fn collect_and_archive(
    archiver: Result<Archiver>,
    tasks: Vec<Box<dyn Task>>,
    collector: Arc<Collector>,
) -> Result<Summary> {
    let total = tasks.len();
    run_all(tasks, Arc::clone(&collector)).await;

    let errors = collector.error_count();
    collector.finalize_errors();
    let blobs = collector.take_blobs();

    let summary = Summary {
        tasks: total,
        blobs: blobs.len(),
        errors,
    };
    info!(tasks = summary.tasks, blobs = summary.blobs, errors = summary.errors, "Collection finished.");

    let mut archiver = match archiver {
        Ok(archiver) => archiver,
        Err(e) => {
            warn!(discarded = blobs.len(), "No archive to write results into.");
            return Err(e);
        }
    };

    let written = archiver.write_all(&blobs);
    if written < blobs.len() {
        warn!(written, expected = blobs.len(), "Some entries could not be archived.");
    }

    let path = archiver.path().to_path_buf();
    archiver.close().map_err(|e: Report| {
        error!(error = %format!("{e:#}"), "Failed to close archive.");
        e
    })?;

    info!(path = %path.display(), entries = written, "Network analysis archived.");
    Ok(summary)
}
