// src/core/probes/dns_probe.rs

use std::fmt::Write as _;
use std::net::IpAddr;

use async_trait::async_trait;
use color_eyre::eyre::{Result, WrapErr};
use hickory_resolver::TokioAsyncResolver;
use tracing::{debug, info};

use crate::core::collector::Collector;
use crate::core::models::Blob;
use crate::core::probes::Task;

/// Resolves the target through the host's own resolver configuration.
///
/// Complements the `dig` runs: this is what applications on the machine
/// actually see, independent of whether `dig` is installed.
#[derive(Debug, Clone)]
pub struct DnsProbe {
    name: String,
    host: String,
}

impl DnsProbe {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
        }
    }

    async fn lookup(&self) -> Result<Vec<IpAddr>> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .wrap_err("loading system resolver configuration")?;
        let response = resolver
            .lookup_ip(self.host.as_str())
            .await
            .wrap_err_with(|| format!("resolving {}", self.host))?;
        Ok(response.iter().collect())
    }
}

/// Renders one `A`/`AAAA` line per address.
pub fn render_addresses(host: &str, addrs: &[IpAddr]) -> String {
    let mut out = String::new();
    for addr in addrs {
        let kind = if addr.is_ipv4() { "A" } else { "AAAA" };
        let _ = writeln!(out, "{host}\t{kind}\t{addr}");
    }
    out
}

#[async_trait]
impl Task for DnsProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, collector: &Collector) {
        info!(name = %self.name, host = %self.host, "Running resolver lookup.");
        match self.lookup().await {
            Ok(addrs) => {
                debug!(host = %self.host, count = addrs.len(), "Resolver lookup finished.");
                collector.record_blob(Blob::new(self.name.clone(), render_addresses(&self.host, &addrs)));
            }
            Err(e) => collector.record_error(e.wrap_err(format!("getting data for {}", self.name))),
        }
    }
}
