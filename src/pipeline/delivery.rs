//! Hand-over of fetched files for each delivery mode

use crate::error::{Error, Result};
use crate::fetcher::FetchedFile;
use crate::types::{DeliveryMode, FetchResult, StreamEvent};
use crate::utils::{sanitize_filename, write_file_atomic};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// The stream consumer has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled;

/// Why a fetched file could not be handed over
#[derive(Debug)]
pub(crate) enum DeliveryFailure {
    /// Writing the file failed; the message is reported as a per-item error
    Save(String),
    /// The stream consumer is gone
    Cancelled,
}

/// A fetched file ready for delivery
pub(crate) struct Delivery<'a> {
    pub column: &'a str,
    pub sequence: usize,
    pub filename: String,
    pub file: FetchedFile,
    pub current: usize,
    pub total: usize,
}

/// Open delivery target of a running pipeline
pub(crate) enum Sink {
    Aggregate,
    Stream(mpsc::Sender<StreamEvent>),
    Directory(PathBuf),
}

impl Sink {
    /// Open the target for `mode`, creating the output directory if needed
    pub(crate) async fn open(mode: DeliveryMode) -> Result<Self> {
        Ok(match mode {
            DeliveryMode::Aggregate => Sink::Aggregate,
            DeliveryMode::Stream(tx) => Sink::Stream(tx),
            DeliveryMode::WriteToDirectory(dir) => {
                if let Err(source) = tokio::fs::create_dir_all(&dir).await {
                    return Err(Error::DownloadDirectory { path: dir, source });
                }
                tracing::debug!(dir = %dir.display(), "Created download directory");
                Sink::Directory(dir)
            }
        })
    }

    /// Send an event to the stream consumer; a no-op for other modes
    pub(crate) async fn emit(&self, event: StreamEvent) -> std::result::Result<(), Cancelled> {
        match self {
            Sink::Stream(tx) => tx.send(event).await.map_err(|_| Cancelled),
            Sink::Aggregate | Sink::Directory(_) => Ok(()),
        }
    }

    /// Prepare per-column output, returning the column directory in write mode
    pub(crate) async fn prepare_column(
        &self,
        column: &str,
    ) -> std::result::Result<Option<PathBuf>, String> {
        let Sink::Directory(base) = self else {
            return Ok(None);
        };

        let column_dir = base.join(sanitize_filename(column));
        tokio::fs::create_dir_all(&column_dir)
            .await
            .map_err(|e| format!("Cannot create directory for column '{column}': {e}"))?;
        Ok(Some(column_dir))
    }

    /// Hand over one fetched file
    pub(crate) async fn deliver(
        &self,
        column_dir: Option<&Path>,
        item: Delivery<'_>,
    ) -> std::result::Result<FetchResult, DeliveryFailure> {
        let Delivery {
            column,
            sequence,
            filename,
            file,
            current,
            total,
        } = item;

        let mut result = FetchResult {
            column: column.to_string(),
            sequence,
            filename,
            extension: file.extension,
            size: file.size,
            data: None,
            path: None,
        };

        match self {
            Sink::Aggregate => {
                result.data = Some(file.bytes);
            }
            Sink::Stream(tx) => {
                let event = StreamEvent::Image {
                    column: result.column.clone(),
                    filename: result.filename.clone(),
                    data: BASE64.encode(&file.bytes),
                    size: result.size,
                    current,
                    total,
                };
                tx.send(event)
                    .await
                    .map_err(|_| DeliveryFailure::Cancelled)?;
            }
            Sink::Directory(base) => {
                let dir = column_dir.unwrap_or(base);
                let path = dir.join(&result.filename);
                let bytes = file.bytes;

                let written =
                    tokio::task::spawn_blocking(move || write_file_atomic(&path, &bytes)).await;
                let path = match written {
                    Ok(Ok(path)) => path,
                    Ok(Err(e)) => {
                        return Err(DeliveryFailure::Save(format!(
                            "Failed to save {}: {e}",
                            result.filename
                        )));
                    }
                    Err(e) => {
                        return Err(DeliveryFailure::Save(format!(
                            "Failed to save {}: write task failed: {e}",
                            result.filename
                        )));
                    }
                };
                result.path = Some(path);
            }
        }

        Ok(result)
    }
}
