//! Upload handler: parse a spreadsheet and register it for later retrieval.

use super::{UploadResponse, parse_upload, read_upload_form};
use crate::api::AppState;
use crate::error::Result;
use axum::{
    Json,
    extract::{Multipart, State},
};

/// POST /upload - Upload a CSV/XLS/XLSX file and list its columns
#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    request_body(content = Vec<u8>, description = "Spreadsheet in the `file` field (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File parsed and registered", body = UploadResponse),
        (status = 400, description = "Missing file, unsupported format or empty file", body = crate::error::ApiError),
        (status = 500, description = "File could not be decoded", body = crate::error::ApiError)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let form = read_upload_form(multipart).await?;
    let size = form.bytes.len();
    let sheet = parse_upload(form.filename.clone(), form.bytes).await?;

    let table = state.registry.put(sheet.into_table(form.filename));

    tracing::info!(
        filename = %table.filename,
        size,
        columns = table.columns.len(),
        rows = table.data_rows().len(),
        "Upload registered"
    );

    Ok(Json(UploadResponse {
        columns: table.columns.clone(),
        filename: table.filename.clone(),
    }))
}
