//! Core types for sheet-image-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;
use utoipa::ToSchema;

/// Number of error messages surfaced to clients per run
pub const MAX_REPORTED_ERRORS: usize = 10;

/// Message returned when a run produced nothing
pub const TRY_DIFFERENT_COLUMNS: &str = "Please try different columns.";

/// A parsed upload, addressable by column
///
/// `rows` holds every raw record of the file, header included (`rows[0]`).
/// Data cells are aligned positionally with `columns`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedTable {
    /// Registry key (sanitized upload filename)
    pub filename: String,
    /// Logical column names in source order
    pub columns: Vec<String>,
    /// Raw records, header first
    pub rows: Vec<Vec<String>>,
}

impl UploadedTable {
    /// Cell index of the first column with this exact name
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Data rows (header excluded)
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// One qualifying cell scheduled for retrieval
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Column the cell belongs to
    pub column: String,
    /// Index into [`UploadedTable::rows`]
    pub row_index: usize,
    /// Trimmed cell value
    pub url: String,
}

/// How a pipeline run hands over its results
pub enum DeliveryMode {
    /// Keep fetched bytes in the outcome
    Aggregate,
    /// Push typed events to a consumer as the run progresses
    Stream(mpsc::Sender<StreamEvent>),
    /// Write each file under `<dir>/<sanitized column>/`
    WriteToDirectory(PathBuf),
}

impl std::fmt::Debug for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMode::Aggregate => f.write_str("Aggregate"),
            DeliveryMode::Stream(_) => f.write_str("Stream"),
            DeliveryMode::WriteToDirectory(dir) => {
                f.debug_tuple("WriteToDirectory").field(dir).finish()
            }
        }
    }
}

/// A successful retrieval
///
/// Failed attempts never produce a `FetchResult`; they are recorded as
/// messages in [`PipelineOutcome::errors`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResult {
    /// Source column name
    pub column: String,
    /// 1-based, gap-free sequence number within the output name
    pub sequence: usize,
    /// Delivered filename (`<column>_<NNN>.<ext>`)
    pub filename: String,
    /// File extension without the leading dot
    pub extension: String,
    /// Size in bytes
    pub size: u64,
    /// File bytes (aggregate mode only)
    pub data: Option<Vec<u8>>,
    /// Written location (write-to-directory mode only)
    pub path: Option<PathBuf>,
}

/// Result of one pipeline run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Fetch attempts made
    pub total_attempted: usize,
    /// Successful deliveries
    pub total_succeeded: usize,
    /// Successful deliveries in column × row order
    pub results: Vec<FetchResult>,
    /// Every per-item error message, in order
    pub errors: Vec<String>,
    /// The consumer went away before the run finished
    pub cancelled: bool,
}

impl PipelineOutcome {
    /// Whether at least one file was delivered
    pub fn success(&self) -> bool {
        self.total_succeeded > 0
    }

    /// The error messages surfaced to clients (at most [`MAX_REPORTED_ERRORS`])
    pub fn reported_errors(&self) -> &[String] {
        let end = self.errors.len().min(MAX_REPORTED_ERRORS);
        &self.errors[..end]
    }

    /// Summary line for clients
    pub fn message(&self) -> String {
        if self.success() {
            format!("{} images downloaded successfully", self.total_succeeded)
        } else {
            TRY_DIFFERENT_COLUMNS.to_string()
        }
    }

    pub(crate) fn record_success(&mut self, result: FetchResult) {
        self.total_succeeded += 1;
        self.results.push(result);
    }
}

/// Event emitted by a streaming run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// First event of every run
    Start {
        /// Qualifying cells across all selected columns
        total: usize,
    },

    /// Emitted before each fetch attempt
    Progress {
        /// Run-wide attempt counter (rolled back on failure)
        current: usize,
        /// Same value as in `start`
        total: usize,
        /// Column being processed
        column: String,
    },

    /// A file was retrieved
    Image {
        /// Source column
        column: String,
        /// Delivered filename
        filename: String,
        /// Base64-encoded file bytes
        data: String,
        /// Size in bytes
        size: u64,
        /// Run-wide counter for this image
        current: usize,
        /// Same value as in `start`
        total: usize,
    },

    /// A per-item or per-column failure
    Error {
        /// Human-readable message
        message: String,
    },

    /// Last event of every run that was not cancelled
    Complete {
        /// Number of `image` events emitted
        total_downloaded: usize,
        /// First errors of the run
        errors: Vec<String>,
    },
}

impl StreamEvent {
    /// Wire name of the event (matches the serialized `type` field)
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Start { .. } => "start",
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::Image { .. } => "image",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Complete { .. } => "complete",
        }
    }
}
