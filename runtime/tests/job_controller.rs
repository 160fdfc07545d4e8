//! End-to-end controller runs against a mocked dataset service.

mod common;

use assert_json_diff::assert_json_eq;
use common::{client_for, config_for, mount_progress, mount_progress_n, mount_snapshot, mount_trigger};
use orgscope::dataset::{
    CollectionRequest, ControllerConfig, HttpDatasetClient, JobController, JobStatus, PollBudget,
    RunOutcome,
};
use orgscope::progress::{self, ProgressEventKind};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller(server: &MockServer) -> JobController<HttpDatasetClient> {
    let config = ControllerConfig::from(&config_for(server));
    JobController::new(client_for(server), config)
}

#[tokio::test]
async fn test_collect_polls_until_ready_and_saves() {
    let server = MockServer::start().await;
    mount_trigger(&server, "s_abc").await;
    mount_progress_n(&server, "s_abc", "running", 2).await;
    mount_progress(&server, "s_abc", "ready").await;
    let snapshot = serde_json::json!([
        { "name": "Acme", "url": "https://www.crunchbase.com/organization/acme" }
    ]);
    mount_snapshot(&server, "s_abc", snapshot.clone()).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("orgs.json");
    let (tx, mut rx) = progress::channel();
    let controller = controller(&server).with_progress(tx);

    let outcome = controller
        .run_with_outcome(
            &CollectionRequest::urls(["https://www.crunchbase.com/organization/acme"]),
            Some(&out),
        )
        .await;

    assert_eq!(
        outcome,
        RunOutcome::Saved {
            path: out.clone(),
            records: 1
        }
    );
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_json_eq!(saved, snapshot);

    let mut statuses = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ProgressEventKind::StatusChanged { status, .. } = event.event {
            statuses.push(status);
        }
    }
    assert_eq!(statuses, vec!["running", "ready"]);
}

#[tokio::test]
async fn test_failed_job_never_fetches() {
    let server = MockServer::start().await;
    mount_trigger(&server, "s_f").await;
    mount_progress(&server, "s_f", "failed").await;
    Mock::given(method("GET"))
        .and(path("/snapshot/s_f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("never.json");
    let ok = controller(&server)
        .run(&CollectionRequest::urls(["https://x.test"]), Some(&out))
        .await;

    assert!(!ok);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_trigger_error_stops_before_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trigger"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = controller(&server)
        .run_with_outcome(&CollectionRequest::keywords(["fintech"]), None)
        .await;
    assert_eq!(outcome, RunOutcome::TriggerFailed);
}

#[tokio::test]
async fn test_missing_status_ends_run() {
    let server = MockServer::start().await;
    mount_trigger(&server, "s_u").await;
    Mock::given(method("GET"))
        .and(path("/progress/s_u"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = controller(&server)
        .run_with_outcome(&CollectionRequest::urls(["https://x.test"]), None)
        .await;
    assert_eq!(
        outcome,
        RunOutcome::JobFailed {
            status: JobStatus::Unknown
        }
    );
}

#[tokio::test]
async fn test_snapshot_error_is_fetch_failure() {
    let server = MockServer::start().await;
    mount_trigger(&server, "s_x").await;
    mount_progress(&server, "s_x", "ready").await;
    Mock::given(method("GET"))
        .and(path("/snapshot/s_x"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = controller(&server)
        .run_with_outcome(
            &CollectionRequest::urls(["https://x.test"]),
            Some(&dir.path().join("out.json")),
        )
        .await;
    assert_eq!(outcome, RunOutcome::FetchFailed);
}

#[tokio::test]
async fn test_budget_gives_up_on_slow_job() {
    let server = MockServer::start().await;
    mount_trigger(&server, "s_slow").await;
    mount_progress(&server, "s_slow", "running").await;

    let config = ControllerConfig {
        poll_interval: Duration::from_millis(10),
        budget: PollBudget::max_wait(Duration::from_millis(50)),
    };
    let controller = JobController::new(client_for(&server), config);
    let outcome = controller
        .run_with_outcome(&CollectionRequest::urls(["https://x.test"]), None)
        .await;

    assert!(matches!(outcome, RunOutcome::TimedOut { .. }));
}
