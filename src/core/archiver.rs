// src/core/archiver.rs

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, Timelike};
use color_eyre::eyre::{Result, WrapErr};
use tracing::{debug, error, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::core::models::Blob;

/// Owns the destination file and the zip writer wrapped around it.
///
/// Only the orchestrating task touches it, and only after every probe has
/// finished, so it needs no locking.
pub struct Archiver {
    path: PathBuf,
    writer: ZipWriter<File>,
}

impl Archiver {
    /// Creates (or truncates) the destination. Readable by the owner only.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options
            .open(&path)
            .wrap_err_with(|| format!("opening {}", path.display()))?;
        info!(path = %path.display(), "Archive opened.");
        Ok(Self {
            path,
            writer: ZipWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds one Deflate-compressed entry named after the blob.
    pub fn write_blob(&mut self, blob: &Blob) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(now());
        self.writer
            .start_file(blob.name.as_str(), options)
            .wrap_err_with(|| format!("creating {} in zip file", blob.name))?;
        self.writer
            .write_all(&blob.contents)
            .wrap_err_with(|| format!("writing {} to zip file", blob.name))?;
        debug!(name = %blob.name, bytes = blob.contents.len(), "Archive entry written.");
        Ok(())
    }

    /// Writes every blob in order. A failed entry is logged and skipped.
    ///
    /// Returns how many entries were written.
    pub fn write_all(&mut self, blobs: &[Blob]) -> usize {
        let mut written = 0;
        for blob in blobs {
            match self.write_blob(blob) {
                Ok(()) => written += 1,
                Err(e) => error!(error = %format!("{e:#}"), "Failed to archive entry."),
            }
        }
        written
    }

    /// Writes the central directory and flushes the file to disk.
    pub fn close(self) -> Result<()> {
        let file = self.writer.finish().wrap_err("closing zip file writer")?;
        file.sync_all().wrap_err("closing zip file")?;
        info!(path = %self.path.display(), "Archive closed.");
        Ok(())
    }
}

// Zip timestamps have no zone; local wall-clock time is what readers expect.
fn now() -> DateTime {
    let now = Local::now();
    DateTime::from_date_and_time(
        now.year().clamp(1980, 2107) as u16,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn scratch_archive(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "network_analyzer_{}_{}_{}.zip",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
        ))
    }

    fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut contents = Vec::new();
                entry.read_to_end(&mut contents).unwrap();
                (entry.name().to_string(), contents)
            })
            .collect()
    }

    #[test]
    fn test_round_trip_preserves_names_contents_and_order() {
        let path = scratch_archive("roundtrip");
        let blobs = vec![
            Blob::new("b.txt", "second letter"),
            Blob::new("a.json", r#"{"hops": []}"#),
            Blob::new("empty.txt", Vec::<u8>::new()),
            Blob::new("binary.bin", (0u8..=255).collect::<Vec<_>>()),
        ];

        let mut archiver = Archiver::create(&path).unwrap();
        assert_eq!(archiver.write_all(&blobs), blobs.len());
        archiver.close().unwrap();

        let entries = read_entries(&path);
        std::fs::remove_file(&path).ok();

        let expected: Vec<(String, Vec<u8>)> =
            blobs.into_iter().map(|b| (b.name, b.contents)).collect();
        assert_eq!(entries, expected);
    }

    #[test]
    fn test_entries_are_deflated() {
        let path = scratch_archive("deflate");
        let mut archiver = Archiver::create(&path).unwrap();
        archiver.write_blob(&Blob::new("x.txt", "x".repeat(4096))).unwrap();
        archiver.close().unwrap();

        let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        assert!(entry.compressed_size() < entry.size());
        drop(entry);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_failed_entry_does_not_stop_the_rest() {
        let path = scratch_archive("duplicate");
        let blobs = vec![
            Blob::new("x.txt", "first"),
            Blob::new("x.txt", "rejected duplicate"),
            Blob::new("y.txt", "after the failure"),
        ];

        let mut archiver = Archiver::create(&path).unwrap();
        assert_eq!(archiver.write_all(&blobs), 2);
        assert!(archiver.close().is_ok());

        let entries = read_entries(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(
            entries,
            vec![
                ("x.txt".to_string(), b"first".to_vec()),
                ("y.txt".to_string(), b"after the failure".to_vec()),
            ]
        );
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let path = scratch_archive("truncate");
        std::fs::write(&path, vec![0xAB; 8192]).unwrap();

        let archiver = Archiver::create(&path).unwrap();
        archiver.close().unwrap();

        assert!(read_entries(&path).is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let path = scratch_archive("nodir").join("out.zip");
        let err = Archiver::create(&path).err().expect("open must fail");
        assert!(format!("{err:#}").starts_with("opening "));
    }
}
