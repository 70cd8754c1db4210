// src/core/mod.rs

/// Shared data types: blobs, capability display modes and run summaries.
pub mod models;

/// Concurrency-safe accumulation of blobs and errors, plus the errors report.
pub mod collector;

/// The task contract and its process, HTTP, resolver and file-read flavors.
pub mod probes;

/// The fixed battery of probes, including capability-dependent ones.
pub mod registry;

/// Launches every task concurrently and waits for all of them.
pub mod scheduler;

/// Serializes collected blobs into the compressed output archive.
pub mod archiver;

/// Ties the pieces together for a single run.
pub mod analyzer;
