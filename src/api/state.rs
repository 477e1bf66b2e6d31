//! Application state for the API server

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::BatchPipeline;
use crate::registry::{InMemoryUploadRegistry, UploadStore};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the upload registry, the retrieval pipeline and configuration.
#[derive(Clone)]
pub struct AppState {
    /// Parsed uploads, keyed by sanitized filename
    pub registry: Arc<dyn UploadStore>,

    /// Retrieval pipeline shared by every request
    pub pipeline: Arc<BatchPipeline>,

    /// Configuration (read-only at runtime)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        registry: Arc<dyn UploadStore>,
        pipeline: Arc<BatchPipeline>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            registry,
            pipeline,
            config,
        }
    }

    /// Create state with an empty in-memory registry and an HTTP-backed pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let pipeline = BatchPipeline::from_config(&config)?;
        Ok(Self::new(
            Arc::new(InMemoryUploadRegistry::new()),
            Arc::new(pipeline),
            config,
        ))
    }
}
