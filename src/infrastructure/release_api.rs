//! Release metadata API client
//!
//! Fetches the release descriptor for a manifest id:
//! `GET {api}/api/v1/manifests/{id}` returning the descriptor as JSON.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::DescriptorSource;
use crate::domain::ReleaseDescriptor;
use crate::error::SourceError;

/// Client for the release metadata API
pub struct ReleaseApiClient {
    client: Client,
    base_url: String,
    manifest_id: String,
}

impl ReleaseApiClient {
    pub fn new(
        base_url: impl Into<String>,
        manifest_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| SourceError::Http {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            manifest_id: manifest_id.into(),
        })
    }

    pub fn manifest_url(&self) -> String {
        format!(
            "{}/api/v1/manifests/{}",
            self.base_url,
            urlencoding::encode(&self.manifest_id)
        )
    }

    /// Fetch and decode the descriptor
    pub async fn fetch(&self) -> Result<ReleaseDescriptor, SourceError> {
        let url = self.manifest_url();
        debug!("Fetching release descriptor from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| SourceError::Http {
            url: url.clone(),
            source,
        })?;
        let descriptor: ReleaseDescriptor =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode {
                what: format!("release descriptor from {}", url),
                message: e.to_string(),
            })?;

        info!(
            "Fetched release {} ({})",
            descriptor.name(),
            descriptor.strategy.as_str()
        );
        Ok(descriptor)
    }
}

impl DescriptorSource for ReleaseApiClient {
    async fn resolve_descriptor(&self) -> Result<ReleaseDescriptor, SourceError> {
        self.fetch().await
    }
}
