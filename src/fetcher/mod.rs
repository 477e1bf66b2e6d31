//! Remote file retrieval
//!
//! Signed file URLs cannot be downloaded directly. Each retrieval takes two
//! hops: an authenticated lookup against the file metadata API that returns a
//! short-lived download URL, then an unauthenticated GET of that URL.
//!
//! ## Architecture
//!
//! The core abstraction is the [`FileFetcher`] trait, consumed by the batch
//! pipeline. [`HttpFileFetcher`] is the production implementation; tests drive
//! the pipeline with scripted fetchers instead.
//!
//! ## Usage
//!
//! ```no_run
//! use sheet_image_dl::fetcher::{FileFetcher, HttpFileFetcher};
//! use sheet_image_dl::config::RemoteConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteConfig {
//!         access_token: Some("pat-123".to_string()),
//!         ..Default::default()
//!     };
//!     let fetcher = HttpFileFetcher::new(&config)?;
//!
//!     let file = fetcher
//!         .fetch("https://f.example.com/hubfs/signed-url-redirect/98765")
//!         .await?;
//!     println!("{} bytes, .{}", file.size, file.extension);
//!     Ok(())
//! }
//! ```

mod http;
mod traits;

pub use http::HttpFileFetcher;
pub use traits::{FetchedFile, FileFetcher};
