//! HTTP client for the media server
//!
//! The traits are the seams the session drives; [`MediaServerClient`]
//! implements them over reqwest, tests implement them with fakes.

use crate::endpoints::Endpoints;
use crate::manifest::{self, ManifestSummary};
use crate::progress::ProgressRecord;
use crate::readiness::ManifestStatus;
use crate::subtitles::{parse_descriptors, DescriptorFormat, SubtitleDescriptor};
use crate::types::PlayerConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

/// Manifest existence check
#[async_trait]
pub trait ManifestProbe: Send + Sync {
    /// HEAD the manifest and classify the status
    async fn check_manifest(&self, file: &str) -> Result<ManifestStatus>;
}

/// Remote progress storage
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load_progress(&self, file: &str) -> Result<ProgressRecord>;

    async fn save_progress(&self, file: &str, record: &ProgressRecord) -> Result<()>;
}

/// Subtitle listing
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    async fn subtitle_descriptors(&self, file: &str) -> Result<Vec<SubtitleDescriptor>>;
}

/// reqwest-backed media server client
#[derive(Debug, Clone)]
pub struct MediaServerClient {
    client: Client,
    endpoints: Endpoints,
}

impl MediaServerClient {
    pub fn new(config: &PlayerConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::with_client(client, Endpoints::new(config.server_url.clone())?))
    }

    pub fn with_client(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetch and summarize the manifest body
    #[instrument(skip(self))]
    pub async fn manifest_summary(&self, file: &str) -> Result<ManifestSummary> {
        let url = self.endpoints.manifest(file)?;
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content = response.text().await?;
        manifest::summarize(&content)
    }
}

#[async_trait]
impl ManifestProbe for MediaServerClient {
    #[instrument(skip(self))]
    async fn check_manifest(&self, file: &str) -> Result<ManifestStatus> {
        let url = self.endpoints.manifest(file)?;
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| Error::ManifestUnreachable(e.to_string()))?;
        let status = response.status().as_u16();
        debug!(status, "Manifest check");
        Ok(ManifestStatus::from_status(status))
    }
}

#[async_trait]
impl ProgressStore for MediaServerClient {
    #[instrument(skip(self))]
    async fn load_progress(&self, file: &str) -> Result<ProgressRecord> {
        let url = self.endpoints.progress(file)?;
        let body = self.client.get(url).send().await?.text().await?;
        Ok(ProgressRecord::from_response(&body))
    }

    #[instrument(skip(self, record), fields(record = %record))]
    async fn save_progress(&self, file: &str, record: &ProgressRecord) -> Result<()> {
        let url = self.endpoints.progress_write(file, record)?;
        // Response body is not meaningful
        self.client.get(url).send().await?;
        Ok(())
    }
}

#[async_trait]
impl SubtitleSource for MediaServerClient {
    #[instrument(skip(self))]
    async fn subtitle_descriptors(&self, file: &str) -> Result<Vec<SubtitleDescriptor>> {
        let url = self.endpoints.subtitles(file)?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "No subtitle listing");
            return Ok(Vec::new());
        }
        let body = response.text().await?;
        Ok(parse_descriptors(&body, DescriptorFormat::detect(&body)))
    }
}
