//! End-to-end tests: upload a sheet, then retrieve its files through the
//! router against a mock file API.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use sheet_image_dl::StreamEvent;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

fn sheet(rows: &[(&str, &str)]) -> Vec<u8> {
    let mut csv = String::from("Name,Image\n");
    for (name, url) in rows {
        csv.push_str(&format!("{name},{url}\n"));
    }
    csv.into_bytes()
}

#[tokio::test]
async fn upload_then_download_writes_column_directory() {
    let server = MockServer::start().await;
    mount_file(&server, "ID1", b"\x89PNG first").await;
    let app = app(config_for(&server));
    let dir = TempDir::new().unwrap();

    let content = sheet(&[("a", signed_url("ID1").as_str()), ("b", "")]);
    let response = app
        .clone()
        .oneshot(upload_request("/upload", "contacts.csv", &content, &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let upload = json_body(response).await;
    assert_eq!(upload["columns"], json!(["Name", "Image"]));

    let response = app
        .oneshot(json_request(
            "/download-images",
            json!({
                "filename": upload["filename"],
                "columns": ["Image"],
                "downloadPath": dir.path().display().to_string(),
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["total_images"], 1);
    assert_eq!(body["message"], "1 images downloaded successfully");

    let written = dir.path().join("Image").join("Image_001.jpg");
    assert_eq!(std::fs::read(written).unwrap(), b"\x89PNG first");
}

#[tokio::test]
async fn failed_lookup_does_not_leave_a_gap() {
    let server = MockServer::start().await;
    mount_file(&server, "ID1", b"first").await;
    mount_missing_file(&server, "GONE").await;
    mount_file(&server, "ID3", b"third").await;
    let app = app(config_for(&server));
    let dir = TempDir::new().unwrap();

    let content = sheet(&[
        ("a", signed_url("ID1").as_str()),
        ("b", signed_url("GONE").as_str()),
        ("c", signed_url("ID3").as_str()),
    ]);
    app.clone()
        .oneshot(upload_request("/upload", "contacts.csv", &content, &[]))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "/download-images",
            json!({
                "filename": "contacts.csv",
                "columns": ["Image"],
                "downloadPath": dir.path().display().to_string(),
            }),
        ))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["total_images"], 2);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].as_str().unwrap().contains("GONE"),
        "error should name the failed URL: {}",
        errors[0]
    );

    let column_dir = dir.path().join("Image");
    assert_eq!(std::fs::read(column_dir.join("Image_001.jpg")).unwrap(), b"first");
    assert_eq!(std::fs::read(column_dir.join("Image_002.jpg")).unwrap(), b"third");
    assert!(!column_dir.join("Image_003.jpg").exists());
}

#[tokio::test]
async fn unresolvable_cells_are_reported_without_calling_the_api() {
    let server = MockServer::start().await;
    let app = app(config_for(&server));

    let content = sheet(&[("a", "https://example.com/not-signed.png")]);
    app.clone()
        .oneshot(upload_request("/upload", "contacts.csv", &content, &[]))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "/download-images",
            json!({"filename": "contacts.csv", "columns": ["Image"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Please try different columns.");
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn stream_delivers_images_as_events() {
    let server = MockServer::start().await;
    mount_file(&server, "ID1", b"first").await;
    let app = app(config_for(&server));

    let content = sheet(&[("a", signed_url("ID1").as_str())]);
    let response = app
        .oneshot(upload_request(
            "/download-images-stream",
            "contacts.csv",
            &content,
            &[("columns", r#"["Image","Missing"]"#)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = text_body(response).await;
    let events: Vec<StreamEvent> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect();

    assert_eq!(events.first(), Some(&StreamEvent::Start { total: 1 }));
    assert!(events.iter().any(|e| matches!(
        e,
        StreamEvent::Image { filename, .. } if filename == "Image_001.jpg"
    )));
    assert!(events.contains(&StreamEvent::Error {
        message: "Column 'Missing' not found".to_string()
    }));
    assert!(matches!(
        events.last(),
        Some(StreamEvent::Complete { total_downloaded: 1, .. })
    ));
}
