//! Shared helpers for the integration tests.

#![allow(dead_code)]

use orgscope::config::DatasetConfig;
use orgscope::dataset::HttpDatasetClient;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

/// Client config pointing at `server` with fast polling.
pub fn config_for(server: &MockServer) -> DatasetConfig {
    DatasetConfig {
        base_url: server.uri(),
        dataset_id: "gd_test".to_string(),
        poll_interval: Duration::from_millis(10),
        request_timeout: Duration::from_secs(5),
        ..DatasetConfig::default()
    }
}

pub fn client_for(server: &MockServer) -> HttpDatasetClient {
    HttpDatasetClient::new(config_for(server), TOKEN)
}

/// Trigger endpoint answering with `snapshot_id`.
pub async fn mount_trigger(server: &MockServer, snapshot_id: &str) {
    Mock::given(method("POST"))
        .and(path("/trigger"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "snapshot_id": snapshot_id })),
        )
        .mount(server)
        .await;
}

/// Progress endpoint reporting `status` for the next `times` polls, ahead of
/// any mock mounted later with default priority.
pub async fn mount_progress_n(server: &MockServer, job_id: &str, status: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/progress/{job_id}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": status })),
        )
        .up_to_n_times(times)
        .with_priority(1)
        .mount(server)
        .await;
}

/// Progress endpoint always reporting `status`.
pub async fn mount_progress(server: &MockServer, job_id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/progress/{job_id}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": status })),
        )
        .mount(server)
        .await;
}

/// Snapshot endpoint returning `body`.
pub async fn mount_snapshot(server: &MockServer, job_id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/snapshot/{job_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
