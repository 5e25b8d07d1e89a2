//! Metadata server probe
//!
//! Inside Compute Engine and other managed environments the metadata server
//! answers with the project id. Everywhere else the host `metadata` does not
//! resolve, so the probe is bounded by a short timeout and never retried.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Project id endpoint of the metadata server
pub const METADATA_PROJECT_URL: &str = "http://metadata/computeMetadata/v1/project/project-id";

/// Header the metadata server requires on every request
pub const METADATA_REQUEST_HEADER: &str = "X-Google-Metadata-Request";

/// Default upper bound for the whole probe
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(1);

/// Single-shot HTTP probe of the metadata server
#[derive(Debug, Clone)]
pub struct MetadataProbe {
    endpoint: Option<String>,
    timeout: Duration,
}

impl MetadataProbe {
    pub fn new() -> Self {
        Self {
            endpoint: Some(METADATA_PROJECT_URL.to_string()),
            timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }

    /// A probe that never touches the network
    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }

    /// Query a different URL, e.g. a local emulator
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Project id reported by the metadata server, if it answers with 200
    pub async fn project_id(&self) -> Option<String> {
        let url = self.endpoint.as_deref()?;

        match self.fetch(url).await {
            Ok(project) => project,
            Err(e) => {
                tracing::debug!("Metadata server unavailable: {:#}", e);
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        tracing::debug!("GET {}", url);

        let client = Client::builder()
            .user_agent(crate::application_name())
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .get(url)
            .header(METADATA_REQUEST_HEADER, "True")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!("Metadata server answered {}", status);
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(body.lines().next().map(str::to_string))
    }
}

impl Default for MetadataProbe {
    fn default() -> Self {
        Self::new()
    }
}
