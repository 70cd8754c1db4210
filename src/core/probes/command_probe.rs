// src/core/probes/command_probe.rs

use std::io::{self, Read};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use color_eyre::eyre::{Report, eyre};
use tokio::process::Command;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use crate::core::collector::Collector;
use crate::core::models::Blob;
use crate::core::probes::Task;

/// Runs an external utility and stores what it printed.
///
/// The blob is kept even when the utility exits non-zero: partial output is
/// often the most useful part of a failed diagnostic.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    pub fn new<I, S>(name: impl Into<String>, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Spawns `program` and waits for it, returning its exit status and everything
/// it printed.
///
/// Stdout and stderr share one pipe, so the captured bytes keep the order in
/// which the child wrote them.
pub async fn combined_output(program: &str, args: &[String]) -> io::Result<(ExitStatus, Vec<u8>)> {
    let (mut reader, writer) = io::pipe()?;
    // The command holds the parent's copies of the write end; it has to be
    // dropped before the reader can see EOF.
    let mut child = {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            .kill_on_drop(true);
        command.spawn()?
    };

    let drain = spawn_blocking(move || {
        let mut combined = Vec::new();
        reader.read_to_end(&mut combined).map(|_| combined)
    });

    let status = child.wait().await?;
    let combined = drain.await.map_err(io::Error::other)??;
    Ok((status, combined))
}

#[async_trait]
impl Task for CommandProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, collector: &Collector) {
        info!(name = %self.name, program = %self.program, args = ?self.args(), "Running command probe.");

        let (status, combined) = match combined_output(&self.program, &self.args).await {
            Ok(result) => result,
            Err(e) => {
                collector.record_error(
                    Report::new(e).wrap_err(format!("getting data for {}", self.name)),
                );
                // An empty entry still shows the probe was attempted.
                collector.record_blob(Blob::new(self.name.clone(), Vec::<u8>::new()));
                return;
            }
        };

        if !status.success() {
            collector.record_error(
                eyre!("{}", status).wrap_err(format!("getting data for {}", self.name)),
            );
        }

        debug!(name = %self.name, status = %status, bytes = combined.len(), "Command probe finished.");
        collector.record_blob(Blob::new(self.name.clone(), combined));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collector::ERRORS_BLOB_NAME;

    fn shell(name: &str, script: &str) -> CommandProbe {
        CommandProbe::new(name, "sh", ["-c", script])
    }

    #[tokio::test]
    async fn test_success_stores_output_without_error() {
        let collector = Collector::new();
        shell("ok.txt", "printf 'hello'").execute(&collector).await;

        assert_eq!(collector.error_count(), 0);
        let blobs = collector.take_blobs();
        assert_eq!(blobs, vec![Blob::new("ok.txt", "hello")]);
    }

    #[tokio::test]
    async fn test_stdout_and_stderr_keep_write_order() {
        let collector = Collector::new();
        shell(
            "both.txt",
            "echo first >&2; sleep 0.1; echo second; sleep 0.1; echo third >&2",
        )
        .execute(&collector)
        .await;

        let blobs = collector.take_blobs();
        assert_eq!(blobs[0].contents, b"first\nsecond\nthird\n".to_vec());
    }

    #[tokio::test]
    async fn test_nonzero_exit_keeps_output_and_records_error() {
        let collector = Collector::new();
        shell("fail.txt", "echo 'probe failed' >&2; exit 3")
            .execute(&collector)
            .await;

        assert_eq!(collector.error_count(), 1);
        collector.finalize_errors();
        let blobs = collector.take_blobs();
        assert_eq!(blobs[0], Blob::new("fail.txt", "probe failed\n"));

        let report = blobs
            .iter()
            .find(|b| b.name == ERRORS_BLOB_NAME)
            .expect("errors report present");
        let text = String::from_utf8_lossy(&report.contents);
        assert!(text.contains("getting data for fail.txt"));
        assert!(text.contains("exit status: 3"));
    }

    #[tokio::test]
    async fn test_missing_program_records_error_and_empty_entry() {
        let collector = Collector::new();
        CommandProbe::new("tracepath.txt", "network-analyzer-no-such-tool", Vec::<String>::new())
            .execute(&collector)
            .await;

        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.take_blobs(), vec![Blob::new("tracepath.txt", Vec::<u8>::new())]);
    }
}
