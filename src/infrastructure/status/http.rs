use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::transcode::job::JobOutcome;
use crate::transcode::pipeline::StatusReporter;

/// Client for the external video-status service. One GET per transition,
/// fire-and-forget: the caller decides whether a failure matters.
#[derive(Clone)]
pub struct StatusClient {
    http: reqwest::Client,
    base_url: String,
}

impl StatusClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StatusReporter for StatusClient {
    async fn notify(&self, job_id: &str, outcome: &JobOutcome) -> Result<()> {
        let url = format!("{}/{}", self.base_url, job_id);

        let mut request = self
            .http
            .get(&url)
            .query(&[("status", outcome.status_str())]);
        if let Some(locator) = outcome.locator() {
            request = request.query(&[("transcoded_video_url", locator)]);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("status request to {url} failed"))?;

        if !response.status().is_success() {
            bail!("status service returned {} for {}", response.status(), url);
        }

        Ok(())
    }
}
