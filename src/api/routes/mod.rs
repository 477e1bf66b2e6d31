//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`upload`] — Spreadsheet upload and column discovery
//! - [`download`] — Aggregate and write-to-directory retrieval
//! - [`stream`] — Server-sent-events retrieval
//! - [`system`] — Health and OpenAPI

use crate::error::{Error, Result};
use crate::ingest::{self, ParsedSheet};
use crate::utils::sanitize_filename;
use axum::extract::Multipart;
use serde::{Deserialize, Serialize};

mod download;
mod stream;
mod system;
mod upload;

// Re-export all handlers so `routes::function_name` works
pub use download::*;
pub use stream::*;
pub use system::*;
pub use upload::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Response for POST /upload
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Column names in source order
    pub columns: Vec<String>,
    /// Registry key to pass back to POST /download-images
    pub filename: String,
}

/// Request body for POST /download-images
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadImagesRequest {
    /// Filename returned by POST /upload
    #[serde(default)]
    pub filename: String,
    /// Columns to retrieve, in processing order
    #[serde(default)]
    pub columns: Vec<String>,
    /// Where to write files; absent or empty returns the files inline.
    /// `"downloads"` selects the server's default download directory.
    #[serde(default, rename = "downloadPath")]
    pub download_path: Option<String>,
}

/// One inline file in a POST /download-images response
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ImagePayload {
    /// Source column
    pub column: String,
    /// Delivered filename
    pub filename: String,
    /// Base64-encoded file bytes
    pub data: String,
    /// Size in bytes
    pub size: u64,
}

/// Response for POST /download-images
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadImagesResponse {
    /// Whether at least one file was delivered
    pub success: bool,
    /// Number of delivered files
    pub total_images: usize,
    /// Summary on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Summary on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Directory files were written to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    /// First per-item errors of the run
    #[serde(default)]
    pub errors: Vec<String>,
    /// Inline files (only when no download path was given)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImagePayload>>,
}

// ============================================================================
// Multipart helpers
// ============================================================================

/// Fields of an upload form
pub(crate) struct UploadForm {
    /// Sanitized client filename
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Raw `columns` field, if sent
    pub columns: Option<String>,
}

/// Read the `file` (and optional `columns`) fields of a multipart form
pub(crate) async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut columns: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid("file", e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| invalid("file", format!("failed to read file: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            "columns" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| invalid("columns", e.to_string()))?;
                columns = Some(text);
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| Error::MissingParameter("file".to_string()))?;
    if filename.trim().is_empty() {
        return Err(Error::MissingParameter("file".to_string()));
    }

    Ok(UploadForm {
        filename: sanitize_filename(&filename),
        bytes,
        columns,
    })
}

/// Parse an upload off the async runtime
pub(crate) async fn parse_upload(filename: String, bytes: Vec<u8>) -> Result<ParsedSheet> {
    tokio::task::spawn_blocking(move || ingest::ingest_file(&filename, &bytes))
        .await
        .map_err(|e| Error::Other(format!("upload parsing task failed: {e}")))?
        .map_err(Error::from)
}

fn invalid(name: &str, reason: String) -> Error {
    Error::InvalidParameter {
        name: name.to_string(),
        reason,
    }
}
