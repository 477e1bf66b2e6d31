//! Shared helpers for pipeline tests.

use crate::config::DownloadConfig;
use crate::error::FetchError;
use crate::fetcher::{FetchedFile, FileFetcher};
use crate::pipeline::BatchPipeline;
use crate::types::UploadedTable;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Fetcher that answers from a fixed script and records every request
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: HashMap<String, Result<FetchedFile, FetchError>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` with extension `ext` for `url`
    pub(crate) fn ok(mut self, url: &str, bytes: &[u8], ext: &str) -> Self {
        self.responses
            .insert(url.to_string(), Ok(FetchedFile::new(bytes.to_vec(), ext)));
        self
    }

    /// Fail `url` with a download error
    pub(crate) fn fail(mut self, url: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Err(FetchError::DownloadFailure {
                resource_id: url.to_string(),
                reason: "HTTP 404".to_string(),
            }),
        );
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedFile, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::UnresolvableUrl {
                    url: url.to_string(),
                })
            })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Build a table from a header and data rows
pub(crate) fn table(header: &[&str], rows: &[&[&str]]) -> UploadedTable {
    let mut all_rows = vec![header.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
    all_rows.extend(
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect::<Vec<_>>()),
    );

    UploadedTable {
        filename: "sheet.csv".to_string(),
        columns: header.iter().map(|s| s.to_string()).collect(),
        rows: all_rows,
    }
}

pub(crate) fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Pipeline around a scripted fetcher, keeping a handle to the fetcher
pub(crate) fn pipeline(fetcher: ScriptedFetcher) -> (BatchPipeline, Arc<ScriptedFetcher>) {
    pipeline_with_buffer(fetcher, DownloadConfig::default().stream_buffer)
}

pub(crate) fn pipeline_with_buffer(
    fetcher: ScriptedFetcher,
    stream_buffer: usize,
) -> (BatchPipeline, Arc<ScriptedFetcher>) {
    let fetcher = Arc::new(fetcher);
    let config = DownloadConfig {
        stream_buffer,
        ..Default::default()
    };
    (
        BatchPipeline::new(Arc::clone(&fetcher) as Arc<dyn FileFetcher>, &config),
        fetcher,
    )
}
