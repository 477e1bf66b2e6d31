use super::*;
use crate::config::Config;
use crate::pipeline::BatchPipeline;
use crate::pipeline::test_helpers::ScriptedFetcher;
use crate::registry::InMemoryUploadRegistry;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;


const BOUNDARY: &str = "sheet-image-dl-test-boundary";

/// State around a scripted fetcher and a fresh registry
fn test_state(fetcher: ScriptedFetcher) -> AppState {
    test_state_with_config(fetcher, Config::default())
}

fn test_state_with_config(fetcher: ScriptedFetcher, config: Config) -> AppState {
    let pipeline = BatchPipeline::new(Arc::new(fetcher), &config.download);
    AppState::new(
        Arc::new(InMemoryUploadRegistry::new()),
        Arc::new(pipeline),
        Arc::new(config),
    )
}

/// Encode multipart form fields: `(name, filename, content)`
fn multipart_body(fields: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, fields: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields)))
        .unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_api_server_starts_and_stops_on_shutdown_signal() {
    let mut config = Config::default();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let state = test_state_with_config(ScriptedFetcher::new(), config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server(state, async move {
        stop_rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = create_router(test_state(ScriptedFetcher::new()));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/upload")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_cors_rejects_unlisted_origin() {
    let app = create_router(test_state(ScriptedFetcher::new()));

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header("origin", "http://evil.example.com")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}

#[tokio::test]
async fn test_cors_wildcard_allows_any_origin() {
    let mut config = Config::default();
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(test_state_with_config(ScriptedFetcher::new(), config));

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header("origin", "http://anywhere.example.com")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_disabled_sends_no_headers() {
    let mut config = Config::default();
    config.server.api.cors_enabled = false;
    let app = create_router(test_state_with_config(ScriptedFetcher::new(), config));

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}

#[tokio::test]
async fn test_body_limit_rejects_oversized_upload() {
    let mut config = Config::default();
    config.server.api.max_upload_bytes = 64;
    let app = create_router(test_state_with_config(ScriptedFetcher::new(), config));

    let large = vec![b'a'; 1024];
    let request = multipart_request("/upload", &[("file", Some("big.csv"), &large)]);
    let response = app.oneshot(request).await.unwrap();

    assert!(
        response.status().is_client_error(),
        "oversized upload should be rejected, got {}",
        response.status()
    );
}

#[tokio::test]
async fn test_registry_is_shared_across_requests() {
    let state = test_state(ScriptedFetcher::new());
    let registry = Arc::clone(&state.registry);
    let app = create_router(state);

    let request = multipart_request("/upload", &[("file", Some("a.csv"), b"Image\nu1\n")]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(registry.len(), 1);
    assert!(registry.get("a.csv").is_some());
}
