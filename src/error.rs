//! Error types for sheet-image-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (ingestion, remote fetches)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for sheet-image-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sheet-image-dl
///
/// Request-level failures. Per-item failures inside a pipeline run never
/// surface as an `Error`; they are recorded in the run's outcome instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "CMS_ACCESS_TOKEN")
        key: Option<String>,
    },

    /// Uploaded spreadsheet could not be ingested
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// A required request parameter was missing or empty
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// A request parameter was present but malformed
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The write-mode target directory could not be created
    #[error("Cannot create download directory: {source}")]
    DownloadDirectory {
        /// Directory that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The referenced upload is not present in the registry
    #[error("upload not found: {0}")]
    UploadNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Spreadsheet ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// File extension is neither `.csv` nor `.xls`/`.xlsx`
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The offending extension (lowercased, with leading dot; empty if none)
        extension: String,
    },

    /// The file parsed to zero records
    #[error("file contains no records")]
    EmptyFile,

    /// The file bytes could not be decoded
    #[error("failed to decode file: {0}")]
    DecodeFailure(String),
}

/// Remote file retrieval errors
///
/// All variants are terminal for the URL they were raised for; nothing is retried.
/// They are reported as per-item messages of a pipeline run, never as a
/// request-level [`Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No access token is configured for the file metadata API
    #[error("no access token configured for the file API")]
    MissingCredential,

    /// The URL carries no resource id after the signed-url marker
    #[error("could not extract a file id from {url}")]
    UnresolvableUrl {
        /// The URL that could not be resolved
        url: String,
    },

    /// The metadata lookup for a signed download URL failed
    #[error("metadata lookup failed for file {resource_id}: {reason}")]
    MetadataFailure {
        /// The resource id that was looked up
        resource_id: String,
        /// The reason the lookup failed
        reason: String,
    },

    /// Fetching the file bytes from the signed download URL failed
    #[error("download failed for file {resource_id}: {reason}")]
    DownloadFailure {
        /// The resource id whose bytes were requested
        resource_id: String,
        /// The reason the download failed
        reason: String,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when a request fails before any
/// pipeline work starts.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "unsupported_format",
///     "message": "ingest error: unsupported file format: .pdf",
///     "details": { "extension": ".pdf" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "upload_not_found", "missing_parameter")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - precondition failures
            Error::Config { .. } => 400,
            Error::MissingParameter(_) => 400,
            Error::InvalidParameter { .. } => 400,
            Error::UploadNotFound(_) => 400,
            Error::DownloadDirectory { .. } => 400,
            Error::Ingest(IngestError::UnsupportedFormat { .. }) => 400,
            Error::Ingest(IngestError::EmptyFile) => 400,

            // 500 Internal Server Error - unexpected failures
            Error::Ingest(IngestError::DecodeFailure(_)) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Ingest(e) => match e {
                IngestError::UnsupportedFormat { .. } => "unsupported_format",
                IngestError::EmptyFile => "empty_file",
                IngestError::DecodeFailure(_) => "decode_failure",
            },
            Error::MissingParameter(_) => "missing_parameter",
            Error::InvalidParameter { .. } => "invalid_parameter",
            Error::UploadNotFound(_) => "upload_not_found",
            Error::DownloadDirectory { .. } => "download_directory_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        // Registry misses surface as a re-upload prompt
        let message = match &error {
            Error::UploadNotFound(_) => "File not found. Please upload the file again.".to_string(),
            _ => error.to_string(),
        };

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Ingest(IngestError::UnsupportedFormat { extension }) => {
                Some(serde_json::json!({ "extension": extension }))
            }
            Error::UploadNotFound(filename) => Some(serde_json::json!({ "filename": filename })),
            Error::MissingParameter(name) | Error::InvalidParameter { name, .. } => {
                Some(serde_json::json!({ "parameter": name }))
            }
            Error::DownloadDirectory { path, .. } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
