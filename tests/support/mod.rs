//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;

use imagery_core::ApiKey;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock provider serves tiles on.
pub const TILE_PATH: &str = "/maps/api/staticmap";

/// Bytes standing in for a JPEG payload.
pub const FAKE_JPEG: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-payload\xFF\xD9";

/// Key used against the mock provider.
pub const TEST_KEY: &str = "test-key-do-not-leak";

pub fn test_key() -> ApiKey {
    ApiKey::new(TEST_KEY).expect("test key is non-empty")
}

/// Endpoint URL of the mock provider.
pub fn endpoint(server: &MockServer) -> String {
    format!("{}{TILE_PATH}", server.uri())
}

/// Mounts a responder that returns `FAKE_JPEG` as `image/jpeg` for every request.
pub async fn mount_jpeg(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(TILE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(FAKE_JPEG),
        )
        .mount(server)
        .await;
}

pub fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write csv");
    path
}
