// src/core/probes/http_probe.rs

use async_trait::async_trait;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{debug, info};

use crate::core::collector::Collector;
use crate::core::models::Blob;
use crate::core::probes::Task;

/// Issues a plain GET and stores the response body.
///
/// The status code is not inspected; only transport and body read failures
/// count as errors, and either one means no blob is stored.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    name: String,
    url: String,
    user_agent: String,
    use_proxy: bool,
}

impl HttpProbe {
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_agent: user_agent.into(),
            use_proxy: true,
        }
    }

    /// Ignores proxy settings from the environment.
    pub fn direct(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        let mut builder = reqwest::Client::builder().user_agent(self.user_agent.as_str());
        if !self.use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .wrap_err("building HTTP client")?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .wrap_err_with(|| format!("getting {} from {}", self.name, self.url))?;
        debug!(url = %self.url, status = %response.status(), "Received HTTP response.");

        let body = response
            .bytes()
            .await
            .wrap_err_with(|| format!("reading {} body", self.name))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Task for HttpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, collector: &Collector) {
        info!(name = %self.name, url = %self.url, "Running HTTP probe.");
        match self.fetch().await {
            Ok(body) => collector.record_blob(Blob::new(self.name.clone(), body)),
            Err(e) => collector.record_error(e),
        }
    }
}
