//! Mock file API serving signed download URLs and file bytes

use serde_json::json;
use sheet_image_dl::Config;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Access token the mock API accepts
pub const TEST_TOKEN: &str = "test-token";

/// Signed cell value that resolves to `resource_id`
pub fn signed_url(resource_id: &str) -> String {
    format!("https://files.example.com/hubfs/12345/signed-url-redirect/{resource_id}")
}

/// Serve `bytes` for `resource_id` through the two-hop flow
pub async fn mount_file(server: &MockServer, resource_id: &str, bytes: &[u8]) {
    let download_path = format!("/download/{resource_id}");

    Mock::given(method("GET"))
        .and(path(format!("/files/v3/files/{resource_id}/signed-url")))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}{download_path}", server.uri()),
            "expiresAt": "2030-01-01T00:00:00Z",
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(download_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}

/// Reject metadata lookups for `resource_id`
pub async fn mount_missing_file(server: &MockServer, resource_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/files/v3/files/{resource_id}/signed-url")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": "error",
            "message": "File not found",
        })))
        .mount(server)
        .await;
}

/// Config pointing at the mock API with the test token
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.remote.api_base_url = server.uri();
    config.remote.access_token = Some(TEST_TOKEN.to_string());
    config
}
