//! HTTP implementation of the two-hop file retrieval

use super::traits::{FetchedFile, FileFetcher};
use crate::config::RemoteConfig;
use crate::error::{Error, FetchError, Result};
use crate::resolver;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Body of the signed-url metadata response
#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    url: Option<String>,
}

/// Fetches files through the CMS file metadata API
///
/// Holds the bearer token for the metadata hop; the download hop is sent
/// without credentials. Both hops share one client and its timeout.
#[derive(Clone, Debug)]
pub struct HttpFileFetcher {
    client: reqwest::Client,
    api_base_url: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl HttpFileFetcher {
    /// Create a fetcher from the remote API configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            timeout: config.request_timeout,
        })
    }

    /// Retrieve the file behind `url` using an explicit token
    ///
    /// # Errors
    ///
    /// - [`FetchError::MissingCredential`] if `token` is absent or blank (no request is made)
    /// - [`FetchError::UnresolvableUrl`] if the URL has no resource id
    /// - [`FetchError::MetadataFailure`] if the signed download URL cannot be obtained
    /// - [`FetchError::DownloadFailure`] if the file bytes cannot be fetched
    pub async fn fetch_with_token(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> std::result::Result<FetchedFile, FetchError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(FetchError::MissingCredential)?;

        let resource_id =
            resolver::extract_resource_id(url).ok_or_else(|| FetchError::UnresolvableUrl {
                url: url.to_string(),
            })?;

        let download_url = self.signed_download_url(&resource_id, token).await?;
        let bytes = self.download(&resource_id, &download_url).await?;

        tracing::debug!(
            resource_id = %resource_id,
            size = bytes.len(),
            "Fetched file"
        );

        Ok(FetchedFile::new(bytes, resolver::infer_extension(url)))
    }

    /// First hop: exchange the resource id for a short-lived download URL
    async fn signed_download_url(
        &self,
        resource_id: &str,
        token: &str,
    ) -> std::result::Result<String, FetchError> {
        let api_url = format!(
            "{}/files/v3/files/{}/signed-url",
            self.api_base_url, resource_id
        );
        let failure = |reason: String| FetchError::MetadataFailure {
            resource_id: resource_id.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&api_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| failure(self.describe_request_error(&e)))?;

        if response.status() != StatusCode::OK {
            return Err(failure(format!("HTTP {}", response.status())));
        }

        let body: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| failure(format!("invalid metadata response: {e}")))?;

        body.url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| failure("response did not include a download URL".to_string()))
    }

    /// Second hop: fetch the bytes, unauthenticated
    async fn download(
        &self,
        resource_id: &str,
        download_url: &str,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let failure = |reason: String| FetchError::DownloadFailure {
            resource_id: resource_id.to_string(),
            reason,
        };

        let response = self
            .client
            .get(download_url)
            .send()
            .await
            .map_err(|e| failure(self.describe_request_error(&e)))?;

        if response.status() != StatusCode::OK {
            return Err(failure(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| failure(self.describe_request_error(&e)))?;

        Ok(bytes.to_vec())
    }

    fn describe_request_error(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!("timed out after {} seconds", self.timeout.as_secs_f64())
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        }
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedFile, FetchError> {
        self.fetch_with_token(url, self.access_token.as_deref())
            .await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
