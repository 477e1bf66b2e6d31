//! Batch retrieval of the files referenced by selected spreadsheet columns
//!
//! A run walks the selected columns in request order and, within each column,
//! the data rows in order. A column named twice is processed once. Every
//! non-blank cell is fetched once; successes are numbered without gaps per
//! output name (the sanitized column), failures become messages in the outcome.
//!
//! How results are handed over depends on the [`DeliveryMode`]:
//! - [`DeliveryMode::Aggregate`] keeps the bytes in the returned outcome
//! - [`DeliveryMode::Stream`] pushes [`StreamEvent`]s to a channel as it goes
//! - [`DeliveryMode::WriteToDirectory`] writes `<dir>/<column>/<column>_NNN.<ext>`

mod delivery;
pub mod targets;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::{Config, DownloadConfig};
use crate::error::Result;
use crate::fetcher::{FileFetcher, HttpFileFetcher};
use crate::types::{DeliveryMode, PipelineOutcome, StreamEvent, UploadedTable};
use crate::utils::{sanitize_filename, sequence_filename};
use delivery::{Cancelled, Delivery, DeliveryFailure, Sink};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Sequential retrieval of every qualifying cell in the selected columns
pub struct BatchPipeline {
    fetcher: Arc<dyn FileFetcher>,
    stream_buffer: usize,
}

impl std::fmt::Debug for BatchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPipeline")
            .field("fetcher", &self.fetcher.name())
            .field("stream_buffer", &self.stream_buffer)
            .finish()
    }
}

/// Counters that live for one run
struct RunState {
    outcome: PipelineOutcome,
    /// Run-wide attempt counter reported in stream events
    current: usize,
    total: usize,
    /// Last sequence number per sanitized column name
    sequences: HashMap<String, usize>,
}

impl BatchPipeline {
    /// Create a pipeline around any fetcher
    pub fn new(fetcher: Arc<dyn FileFetcher>, config: &DownloadConfig) -> Self {
        Self {
            fetcher,
            stream_buffer: config.stream_buffer.max(1),
        }
    }

    /// Create a pipeline that fetches over HTTP with the configured credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFileFetcher::new(&config.remote)?;
        Ok(Self::new(Arc::new(fetcher), &config.download))
    }

    /// Retrieve every qualifying cell of `columns` and deliver it per `mode`
    ///
    /// Per-item problems (unknown column, failed fetch, failed write) never
    /// abort the run; they are collected in [`PipelineOutcome::errors`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DownloadDirectory`](crate::Error::DownloadDirectory)
    /// if the target directory of [`DeliveryMode::WriteToDirectory`] cannot be
    /// created.
    pub async fn run(
        &self,
        table: &UploadedTable,
        columns: &[String],
        mode: DeliveryMode,
    ) -> Result<PipelineOutcome> {
        let columns = targets::distinct_columns(columns);
        let columns = columns.as_slice();
        let total = targets::count_qualifying(table, columns);
        let streaming = matches!(mode, DeliveryMode::Stream(_));

        tracing::info!(
            filename = %table.filename,
            columns = columns.len(),
            total,
            ?mode,
            fetcher = self.fetcher.name(),
            "Starting retrieval run"
        );

        if total == 0 && !streaming {
            tracing::info!(filename = %table.filename, "No qualifying cells in selected columns");
            let errors = columns
                .iter()
                .filter(|column| table.column_position(column).is_none())
                .map(|column| column_not_found(column))
                .collect();
            return Ok(PipelineOutcome {
                errors,
                ..PipelineOutcome::default()
            });
        }

        let sink = Sink::open(mode).await?;
        let mut state = RunState {
            outcome: PipelineOutcome::default(),
            current: 0,
            total,
            sequences: HashMap::new(),
        };

        let finished = match sink.emit(StreamEvent::Start { total }).await {
            Ok(()) => self.process_columns(table, columns, &sink, &mut state).await,
            Err(cancelled) => Err(cancelled),
        };

        let finished = match finished {
            Ok(()) => sink
                .emit(StreamEvent::Complete {
                    total_downloaded: state.outcome.total_succeeded,
                    errors: state.outcome.reported_errors().to_vec(),
                })
                .await,
            Err(cancelled) => Err(cancelled),
        };

        let mut outcome = state.outcome;
        if finished.is_err() {
            outcome.cancelled = true;
            tracing::info!(
                filename = %table.filename,
                succeeded = outcome.total_succeeded,
                "Stream consumer disconnected, run cancelled"
            );
        } else {
            tracing::info!(
                filename = %table.filename,
                attempted = outcome.total_attempted,
                succeeded = outcome.total_succeeded,
                errors = outcome.errors.len(),
                "Retrieval run complete"
            );
        }

        Ok(outcome)
    }

    /// Spawn a streaming run and return its events
    ///
    /// The run stops at the next event after the returned stream is dropped.
    pub fn stream(
        self: Arc<Self>,
        table: Arc<UploadedTable>,
        columns: Vec<String>,
    ) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(self.stream_buffer);

        tokio::spawn(async move {
            if let Err(e) = self.run(&table, &columns, DeliveryMode::Stream(tx)).await {
                tracing::error!(filename = %table.filename, error = %e, "Streaming run failed");
            }
        });

        ReceiverStream::new(rx)
    }

    async fn process_columns(
        &self,
        table: &UploadedTable,
        columns: &[String],
        sink: &Sink,
        state: &mut RunState,
    ) -> std::result::Result<(), Cancelled> {
        for column in columns {
            if table.column_position(column).is_none() {
                tracing::warn!(filename = %table.filename, column = %column, "Column not found");
                record_error(sink, state, column_not_found(column)).await?;
                continue;
            }

            let column_dir = match sink.prepare_column(column).await {
                Ok(dir) => dir,
                Err(message) => {
                    tracing::warn!(column = %column, error = %message, "Skipping column");
                    record_error(sink, state, message).await?;
                    continue;
                }
            };

            // Columns that sanitize alike share a directory and continue its numbering
            let output_name = sanitize_filename(column);
            let mut sequence = state.sequences.get(&output_name).copied().unwrap_or(0);

            for target in targets::column_targets(table, column) {
                sequence += 1;
                state.current += 1;
                state.outcome.total_attempted += 1;

                sink.emit(StreamEvent::Progress {
                    current: state.current,
                    total: state.total,
                    column: column.clone(),
                })
                .await?;

                tracing::debug!(
                    column = %column,
                    row = target.row_index,
                    url = %target.url,
                    "Fetching file"
                );

                let file = match self.fetcher.fetch(&target.url).await {
                    Ok(file) => file,
                    Err(e) => {
                        sequence -= 1;
                        state.current -= 1;
                        let message = format!("Failed to download from {}: {e}", target.url);
                        tracing::warn!(column = %column, row = target.row_index, error = %e, "Fetch failed");
                        record_error(sink, state, message).await?;
                        continue;
                    }
                };

                let item = Delivery {
                    column,
                    sequence,
                    filename: sequence_filename(column, sequence, &file.extension),
                    file,
                    current: state.current,
                    total: state.total,
                };

                match sink.deliver(column_dir.as_deref(), item).await {
                    Ok(result) => state.outcome.record_success(result),
                    Err(DeliveryFailure::Save(message)) => {
                        sequence -= 1;
                        state.current -= 1;
                        tracing::warn!(column = %column, error = %message, "Write failed");
                        record_error(sink, state, message).await?;
                    }
                    Err(DeliveryFailure::Cancelled) => return Err(Cancelled),
                }
            }

            state.sequences.insert(output_name, sequence);
        }

        Ok(())
    }
}

fn column_not_found(column: &str) -> String {
    format!("Column '{column}' not found")
}

/// Record a per-item error and forward it to the stream consumer
async fn record_error(
    sink: &Sink,
    state: &mut RunState,
    message: String,
) -> std::result::Result<(), Cancelled> {
    state.outcome.errors.push(message.clone());
    sink.emit(StreamEvent::Error { message }).await
}
