//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the sheet-image-dl REST
//! API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the sheet-image-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "sheet-image-dl REST API",
        version = "0.1.0",
        description = "Upload spreadsheets of signed file URLs and retrieve the referenced files inline, to a directory, or as a server-sent event stream",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Uploads
        crate::api::routes::upload_file,

        // Retrieval
        crate::api::routes::download_images,
        crate::api::routes::download_images_stream,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::StreamEvent,

        // Config types from config.rs
        crate::config::Config,
        crate::config::RemoteConfig,
        crate::config::DownloadConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        // API request/response types from routes
        crate::api::routes::UploadResponse,
        crate::api::routes::DownloadImagesRequest,
        crate::api::routes::DownloadImagesResponse,
        crate::api::routes::ImagePayload,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "uploads", description = "Uploads - Parse a spreadsheet and list its columns"),
        (name = "downloads", description = "Retrieval - Fetch every file referenced by selected columns"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
