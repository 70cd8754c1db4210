// src/core/collector.rs

use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use color_eyre::eyre::Report;
use tracing::{debug, warn};

use crate::core::models::Blob;

/// Name of the synthesized entry listing every recorded failure.
pub const ERRORS_BLOB_NAME: &str = "errors.txt";

/// Separator placed after each entry of the errors report.
pub const ERROR_DELIMITER: &str = "\n\n----------\n\n";

/// Thread-safe accumulator shared by every running task.
///
/// Blobs and errors sit behind independent locks, each held only for the
/// length of a single push. Insertion order is completion order.
#[derive(Debug, Default)]
pub struct Collector {
    blobs: Mutex<Vec<Blob>>,
    errors: Mutex<Vec<Report>>,
}

// An append either happened or it didn't, so a poisoned list is still intact.
fn relock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_blob(&self, blob: Blob) {
        debug!(name = %blob.name, bytes = blob.contents.len(), "Recording blob.");
        relock(&self.blobs).push(blob);
    }

    pub fn record_error(&self, err: Report) {
        warn!(error = %format!("{err:#}"), "Recording task failure.");
        relock(&self.errors).push(err);
    }

    pub fn blob_count(&self) -> usize {
        relock(&self.blobs).len()
    }

    pub fn error_count(&self) -> usize {
        relock(&self.errors).len()
    }

    /// Appends the errors report as a final blob when at least one error was
    /// recorded. Must only be called once every task has finished.
    pub fn finalize_errors(&self) {
        let report = {
            let errors = relock(&self.errors);
            if errors.is_empty() {
                return;
            }
            render_errors(&errors)
        };
        self.record_blob(Blob::new(ERRORS_BLOB_NAME, report));
    }

    /// Hands over every blob recorded so far, in recording order.
    pub fn take_blobs(&self) -> Vec<Blob> {
        std::mem::take(&mut *relock(&self.blobs))
    }
}

fn render_errors(errors: &[Report]) -> String {
    let mut buf = String::new();
    for err in errors {
        // Writing into a String cannot fail.
        let _ = write!(buf, "{err:#}{ERROR_DELIMITER}");
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::eyre;
    use std::sync::Arc;

    #[test]
    fn test_no_errors_means_no_report() {
        let collector = Collector::new();
        collector.record_blob(Blob::new("a.txt", "a"));
        collector.finalize_errors();

        let blobs = collector.take_blobs();
        assert_eq!(blobs.len(), 1);
        assert!(blobs.iter().all(|b| b.name != ERRORS_BLOB_NAME));
    }

    #[test]
    fn test_errors_report_lists_every_error_with_context() {
        let collector = Collector::new();
        collector.record_blob(Blob::new("a.txt", "a"));
        collector.record_error(eyre!("exit status: 2").wrap_err("getting data for a.txt"));
        collector.record_error(eyre!("reading resolv.conf"));
        collector.finalize_errors();

        let blobs = collector.take_blobs();
        assert_eq!(blobs.len(), 2);
        let report = blobs.last().unwrap();
        assert_eq!(report.name, ERRORS_BLOB_NAME);

        let text = String::from_utf8(report.contents.clone()).unwrap();
        let entries: Vec<&str> = text
            .split(ERROR_DELIMITER)
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(
            entries,
            vec!["getting data for a.txt: exit status: 2", "reading resolv.conf"]
        );
    }

    #[test]
    fn test_blobs_keep_recording_order() {
        let collector = Collector::new();
        for name in ["first", "second", "third"] {
            collector.record_blob(Blob::new(name, name));
        }
        let names: Vec<String> = collector.take_blobs().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_records_are_not_lost() {
        let collector = Arc::new(Collector::new());
        let mut handles = Vec::new();
        for i in 0..100 {
            let collector = Arc::clone(&collector);
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    collector.record_blob(Blob::new(format!("blob-{i}"), vec![i as u8]));
                } else {
                    collector.record_error(eyre!("failure {i}"));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(collector.blob_count() + collector.error_count(), 100);
        assert_eq!(collector.blob_count(), 50);
        assert_eq!(collector.error_count(), 50);
    }
}
