//! Configuration types for sheet-image-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Remote file API settings (endpoint, credential, timeouts)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RemoteConfig {
    /// Base URL of the file metadata API (default: "https://api.hubapi.com")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token for the file metadata API
    ///
    /// Never issued by this crate; supplied out-of-band (usually `CMS_ACCESS_TOKEN`).
    #[serde(default)]
    pub access_token: Option<String>,

    /// Timeout applied to each metadata and download request (default: 30s)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            access_token: None,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Delivery settings for pipeline runs
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Directory used when a request asks for the `"downloads"` target
    /// (default: "downloads/cms-images")
    #[serde(default = "default_download_dir")]
    pub default_download_dir: PathBuf,

    /// Capacity of the event channel between a streaming run and its consumer (default: 16)
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_download_dir: default_download_dir(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

/// Main configuration
///
/// Fields are organized into logical sub-configs:
/// - [`remote`](RemoteConfig) — file API endpoint, token, timeouts
/// - [`download`](DownloadConfig) — delivery targets and stream buffering
/// - [`server`](ServerIntegrationConfig) — REST API settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Remote file API settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Delivery settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Unset variables keep their defaults. See [`Config::from_lookup`] for the
    /// recognised variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// Recognised variables:
    /// - `CMS_ACCESS_TOKEN` - bearer token for the file API
    /// - `CMS_API_BASE_URL` - file API base URL
    /// - `CMS_REQUEST_TIMEOUT_SECS` - per-request timeout in seconds
    /// - `BIND_ADDRESS` - API listen address (e.g. `127.0.0.1:5000`)
    /// - `CORS_ORIGINS` - comma-separated allowed origins
    /// - `MAX_CONTENT_LENGTH` - maximum upload size in bytes
    /// - `DOWNLOAD_DIR` - default download directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first variable that fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(token) = lookup("CMS_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()) {
            config.remote.access_token = Some(token.trim().to_string());
        }
        if let Some(base) = lookup("CMS_API_BASE_URL") {
            config.remote.api_base_url = base.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("CMS_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_var("CMS_REQUEST_TIMEOUT_SECS", &secs)?;
            config.remote.request_timeout = Duration::from_secs(secs);
        }
        if let Some(addr) = lookup("BIND_ADDRESS") {
            config.server.api.bind_address = parse_var("BIND_ADDRESS", &addr)?;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.server.api.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(limit) = lookup("MAX_CONTENT_LENGTH") {
            config.server.api.max_upload_bytes = parse_var("MAX_CONTENT_LENGTH", &limit)?;
        }
        if let Some(dir) = lookup("DOWNLOAD_DIR") {
            config.download.default_download_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Return the configured access token, or fail if none is set
    ///
    /// Deployments that treat a missing credential as a startup failure call
    /// this before serving; library callers may skip it and get
    /// [`FetchError::MissingCredential`](crate::error::FetchError::MissingCredential)
    /// per fetch instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] keyed on `CMS_ACCESS_TOKEN`.
    pub fn require_access_token(&self) -> Result<&str> {
        self.remote
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config {
                message: "an access token for the file API is required".to_string(),
                key: Some("CMS_ACCESS_TOKEN".to_string()),
            })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::Config {
        message: format!("invalid value {value:?}: {e}"),
        key: Some(key.to_string()),
    })
}

/// Server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: the local front-end origins; "*" allows any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Maximum request body size in bytes (default: 16 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.hubapi.com".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads").join("cms-images")
}

fn default_stream_buffer() -> usize {
    16
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://127.0.0.1:3000".into(),
    ]
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
