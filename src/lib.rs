//! # sheet-image-dl
//!
//! Bulk retrieval of files referenced by signed URLs in uploaded spreadsheets.
//!
//! A CSV or XLS/XLSX file is parsed into named columns. For every non-blank
//! cell of the selected columns, the file behind the signed URL is resolved
//! through an authenticated metadata API and downloaded. Results are returned
//! in one of three ways:
//! - **Aggregate** - all file bytes in a single outcome
//! - **Stream** - typed progress/image/error events as the run proceeds
//! - **Write to directory** - one sub-directory per column, sequentially named files
//!
//! Per-item failures never abort a run; they are collected as messages and the
//! remaining cells are still processed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sheet_image_dl::{BatchPipeline, Config, DeliveryMode, ingest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let pipeline = BatchPipeline::from_config(&config)?;
//!
//!     let bytes = std::fs::read("contacts.csv")?;
//!     let table = ingest::ingest_file("contacts.csv", &bytes)?.into_table("contacts.csv");
//!
//!     let outcome = pipeline
//!         .run(
//!             &table,
//!             &["Headshot".to_string()],
//!             DeliveryMode::WriteToDirectory("out".into()),
//!         )
//!         .await?;
//!     println!("{}", outcome.message());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Remote file retrieval
pub mod fetcher;
/// Spreadsheet ingestion
pub mod ingest;
/// Batch retrieval pipeline
pub mod pipeline;
/// Parsed upload storage
pub mod registry;
/// Signed URL inspection
pub mod resolver;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use api::AppState;
pub use config::{ApiConfig, Config, DownloadConfig, RemoteConfig};
pub use error::{ApiError, Error, ErrorDetail, FetchError, IngestError, Result, ToHttpStatus};
pub use fetcher::{FetchedFile, FileFetcher, HttpFileFetcher};
pub use pipeline::BatchPipeline;
pub use registry::{InMemoryUploadRegistry, UploadStore};
pub use types::{
    DeliveryMode, DownloadTarget, FetchResult, PipelineOutcome, StreamEvent, UploadedTable,
};

/// Helper function to run the API server with graceful signal handling.
///
/// Requires an access token, builds the server state from `config`, and
/// serves until a termination signal arrives.
///
/// Shutdown starts on Ctrl+C, or on SIGTERM on Unix.
///
/// # Errors
///
/// Returns [`Error::Config`] if no access token is configured, or an error if
/// the server cannot bind its address.
///
/// # Example
///
/// ```no_run
/// use sheet_image_dl::{Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env()?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(config).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(config: Config) -> Result<()> {
    config.require_access_token()?;
    let state = AppState::from_config(std::sync::Arc::new(config))?;
    api::start_api_server(state, wait_for_signal()).await
}

/// Resolve on Ctrl+C, or on SIGTERM where the platform has it
async fn wait_for_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => tracing::info!("Received interrupt signal, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
