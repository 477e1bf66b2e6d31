//! Streaming retrieval handler: server-sent events, one per pipeline event.

use super::{parse_upload, read_upload_form};
use crate::api::AppState;
use crate::error::{Error, Result};
use axum::{
    extract::{Multipart, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;

/// POST /download-images-stream - Stream files as they are retrieved
///
/// The upload is parsed for this request only and is not registered. Each SSE
/// event is named after the event's `type` and carries the JSON event as data.
#[utoipa::path(
    post,
    path = "/download-images-stream",
    tag = "downloads",
    request_body(content = Vec<u8>, description = "Spreadsheet in the `file` field and a JSON array of column names in the `columns` field (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Event stream of `StreamEvent` values (text/event-stream)", content_type = "text/event-stream", body = crate::types::StreamEvent),
        (status = 400, description = "Missing or malformed parameters, unsupported file", body = crate::error::ApiError),
        (status = 500, description = "File could not be decoded", body = crate::error::ApiError)
    )
)]
pub async fn download_images_stream(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Sse<impl tokio_stream::Stream<Item = std::result::Result<SseEvent, Infallible>>>> {
    let form = read_upload_form(multipart).await?;

    let raw_columns = form
        .columns
        .ok_or_else(|| Error::MissingParameter("columns".to_string()))?;
    let columns: Vec<String> =
        serde_json::from_str(&raw_columns).map_err(|e| Error::InvalidParameter {
            name: "columns".to_string(),
            reason: format!("expected a JSON array of column names: {e}"),
        })?;
    if columns.is_empty() {
        return Err(Error::MissingParameter("columns".to_string()));
    }

    let sheet = parse_upload(form.filename.clone(), form.bytes).await?;
    let table = Arc::new(sheet.into_table(form.filename));

    tracing::info!(
        filename = %table.filename,
        columns = columns.len(),
        "Starting streaming retrieval"
    );

    let events = Arc::clone(&state.pipeline).stream(table, columns);
    let sse_stream = events.filter_map(|event| match serde_json::to_string(&event) {
        Ok(json_data) => Some(Ok(SseEvent::default()
            .event(event.event_type())
            .data(json_data))),
        Err(e) => {
            tracing::warn!(error = %e, event = event.event_type(), "Failed to serialize stream event");
            None
        }
    });

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}
