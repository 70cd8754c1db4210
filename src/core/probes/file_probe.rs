// src/core/probes/file_probe.rs

use std::path::PathBuf;

use async_trait::async_trait;
use color_eyre::eyre::WrapErr;
use tracing::info;

use crate::core::collector::Collector;
use crate::core::models::Blob;
use crate::core::probes::Task;

/// Copies a local file, such as the resolver configuration, into the archive.
#[derive(Debug, Clone)]
pub struct FileProbe {
    name: String,
    path: PathBuf,
}

impl FileProbe {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl Task for FileProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, collector: &Collector) {
        info!(name = %self.name, path = %self.path.display(), "Reading local file.");
        match tokio::fs::read(&self.path)
            .await
            .wrap_err_with(|| format!("reading {}", self.path.display()))
        {
            Ok(contents) => collector.record_blob(Blob::new(self.name.clone(), contents)),
            Err(e) => collector.record_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "network_analyzer_{}_{}_{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
        ))
    }

    #[tokio::test]
    async fn test_reads_existing_file() {
        let path = scratch_path("resolv");
        std::fs::write(&path, b"nameserver 192.0.2.53\n").unwrap();

        let collector = Collector::new();
        FileProbe::new("resolv.conf", &path).execute(&collector).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(collector.error_count(), 0);
        assert_eq!(
            collector.take_blobs(),
            vec![Blob::new("resolv.conf", "nameserver 192.0.2.53\n")]
        );
    }

    #[tokio::test]
    async fn test_missing_file_records_error_only() {
        let path = scratch_path("missing");
        let collector = Collector::new();
        FileProbe::new("resolv.conf", &path).execute(&collector).await;

        assert_eq!(collector.blob_count(), 0);
        assert_eq!(collector.error_count(), 1);
    }
}
