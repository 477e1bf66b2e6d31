//! Batch retrieval handler returning one JSON summary.

use super::{DownloadImagesRequest, DownloadImagesResponse, ImagePayload};
use crate::api::AppState;
use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::types::{DeliveryMode, PipelineOutcome, TRY_DIFFERENT_COLUMNS};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::path::{Path, PathBuf};

/// Value of `downloadPath` that selects the configured default directory
pub const DEFAULT_DOWNLOAD_ALIAS: &str = "downloads";

/// POST /download-images - Retrieve every file referenced by the selected columns
#[utoipa::path(
    post,
    path = "/download-images",
    tag = "downloads",
    request_body = DownloadImagesRequest,
    responses(
        (status = 200, description = "At least one file was retrieved", body = DownloadImagesResponse),
        (status = 400, description = "Missing parameters, unknown upload, uncreatable download directory, or nothing retrieved", body = DownloadImagesResponse)
    )
)]
pub async fn download_images(
    State(state): State<AppState>,
    Json(request): Json<DownloadImagesRequest>,
) -> Result<Response> {
    let filename = request.filename.trim();
    if filename.is_empty() {
        return Err(Error::MissingParameter("filename".to_string()));
    }
    if request.columns.is_empty() {
        return Err(Error::MissingParameter("columns".to_string()));
    }

    let table = state
        .registry
        .get(filename)
        .ok_or_else(|| Error::UploadNotFound(filename.to_string()))?;

    let target = resolve_download_path(request.download_path.as_deref(), &state.config.download);
    let mode = match &target {
        Some(dir) => DeliveryMode::WriteToDirectory(dir.clone()),
        None => DeliveryMode::Aggregate,
    };

    let outcome = state.pipeline.run(&table, &request.columns, mode).await?;
    let status = if outcome.success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(summarize(outcome, target.as_deref()))).into_response())
}

/// Map the request's `downloadPath` to a target directory
///
/// `None` means aggregate delivery.
pub fn resolve_download_path(raw: Option<&str>, config: &DownloadConfig) -> Option<PathBuf> {
    let raw = raw.map(str::trim).filter(|p| !p.is_empty())?;
    if raw == DEFAULT_DOWNLOAD_ALIAS {
        Some(config.default_download_dir.clone())
    } else {
        Some(PathBuf::from(raw))
    }
}

fn summarize(outcome: PipelineOutcome, target: Option<&Path>) -> DownloadImagesResponse {
    let errors = outcome.reported_errors().to_vec();

    if !outcome.success() {
        return DownloadImagesResponse {
            success: false,
            total_images: 0,
            message: None,
            error: Some(TRY_DIFFERENT_COLUMNS.to_string()),
            download_path: None,
            errors,
            images: None,
        };
    }

    let message = outcome.message();
    let images = match target {
        Some(_) => None,
        None => Some(
            outcome
                .results
                .into_iter()
                .map(|result| ImagePayload {
                    data: result
                        .data
                        .as_deref()
                        .map(|bytes| BASE64.encode(bytes))
                        .unwrap_or_default(),
                    column: result.column,
                    filename: result.filename,
                    size: result.size,
                })
                .collect(),
        ),
    };

    DownloadImagesResponse {
        success: true,
        total_images: outcome.total_succeeded,
        message: Some(message),
        error: None,
        download_path: target.map(|p| p.display().to_string()),
        errors,
        images,
    }
}
