// src/core/models.rs

use strum::{Display, EnumIter};

// --- Core Data Models ---

/// A named payload destined for a single archive entry.
///
/// The name doubles as the entry path inside the archive. Uniqueness is the
/// producer's concern; nothing downstream deduplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub name: String,
    pub contents: Vec<u8>,
}

impl Blob {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

// --- Capability Detection Models ---

/// The mutually exclusive ways an mtr report can be rendered, picked from the
/// options the installed mtr advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum DisplayMode {
    /// Machine-readable output (`--json`).
    Json,
    /// Wide text report (`--report-wide`).
    ReportWide,
    /// Plain text report with reverse lookups disabled. Always available.
    Report,
}

impl DisplayMode {
    /// Command-line flags selecting this mode.
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            DisplayMode::Json => &["--json"],
            DisplayMode::ReportWide => &["--report-wide"],
            DisplayMode::Report => &["--report", "--no-dns"],
        }
    }

    /// Extension of the archive entries produced in this mode.
    pub fn extension(&self) -> &'static str {
        match self {
            DisplayMode::Json => "json",
            DisplayMode::ReportWide | DisplayMode::Report => "txt",
        }
    }
}

/// Final tallies of a run, reported once the archive is closed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub tasks: usize,
    pub blobs: usize,
    pub errors: usize,
}
