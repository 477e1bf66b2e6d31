//! Trait and types for remote file retrieval

use crate::error::FetchError;
use async_trait::async_trait;

/// Bytes retrieved for one signed URL
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Raw file content
    pub bytes: Vec<u8>,
    /// Extension inferred from the signed URL (no leading dot)
    pub extension: String,
    /// Content length in bytes
    pub size: u64,
}

impl FetchedFile {
    /// Wrap downloaded bytes, recording their length
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        let size = bytes.len() as u64;
        Self {
            bytes,
            extension: extension.into(),
            size,
        }
    }
}

/// Trait for retrieving the file behind a signed URL
///
/// Implementations make exactly one attempt per call; a failure is terminal for
/// that URL.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Retrieve the file referenced by `url`
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing which hop failed.
    async fn fetch(&self, url: &str) -> Result<FetchedFile, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
