// src/core/probes/mod.rs

// Every probe, whatever it talks to, is driven through the same `Task` trait
// so the scheduler never needs to know what sits behind it.
pub mod command_probe;
pub mod dns_probe;
pub mod file_probe;
pub mod http_probe;

use async_trait::async_trait;

use crate::core::collector::Collector;

pub use self::command_probe::CommandProbe;
pub use self::dns_probe::DnsProbe;
pub use self::file_probe::FileProbe;
pub use self::http_probe::HttpProbe;

/// One independent unit of diagnostic work.
///
/// Implementations report through the shared [`Collector`]: a blob for
/// whatever they captured, an error for whatever went wrong, or both.
#[async_trait]
pub trait Task: Send + Sync {
    /// The archive entry name this task produces. Also used to tag its errors.
    fn name(&self) -> &str;

    /// Runs the probe to completion. Never panics on external failure.
    async fn execute(&self, collector: &Collector);
}
