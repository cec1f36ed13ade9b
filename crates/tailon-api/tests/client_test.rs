#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tailon_api::{ApiClient, Error, LifecycleState, ReconnectConfig, StreamEvent};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn app_json(name: &str, state: &str) -> serde_json::Value {
    json!({
        "config": {
            "name": name,
            "path": "/usr/bin/python3",
            "args": ["-m", "http.server"],
            "env": null,
            "working_dir": "/srv"
        },
        "state": state,
        "pid": 4242,
        "last_exit_code": 0,
        "state_changed_by": {
            "id": "u1",
            "display_name": "Ada",
            "login_name": "ada@example.com",
            "node": "laptop",
            "is_anonymous": false
        },
        "state_changed_at": "2026-01-01T10:00:00Z"
    })
}

// ── Snapshot tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_applications() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "web": app_json("web", "running"),
            "worker": {
                "config": { "name": "worker", "path": "/bin/worker" },
                "state": "not_running",
                "last_exit_code": 3
            }
        })))
        .mount(&server)
        .await;

    let apps = client.list_applications().await.unwrap();

    assert_eq!(apps.len(), 2);
    let web = &apps["web"];
    assert_eq!(web.state, LifecycleState::Running);
    assert_eq!(web.pid, Some(4242));
    assert_eq!(web.state_changed_by.as_ref().unwrap().display_name, "Ada");
    let worker = &apps["worker"];
    assert_eq!(worker.state, LifecycleState::NotRunning);
    assert_eq!(worker.last_exit_code, Some(3));
    assert!(worker.state_changed_at.is_none());
}

#[tokio::test]
async fn test_list_applications_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(client.list_applications().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_carries_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/apps"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database on fire"))
        .mount(&server)
        .await;

    let result = client.list_applications().await;

    match result {
        Err(Error::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database on fire");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = client.list_applications().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Action tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_application() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/apps/web/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "started" })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.start_application("web").await.unwrap();
    assert_eq!(resp.status, "started");
}

#[tokio::test]
async fn test_force_stop_sends_query_flag() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/apps/web/stop"))
        .and(query_param("force", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "force_stopped" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.stop_application("web", true).await.unwrap();
    assert_eq!(resp.status, "force_stopped");
}

#[tokio::test]
async fn test_restart_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/apps/ghost/restart"))
        .respond_with(ResponseTemplate::new(404).set_body_string("application not found"))
        .mount(&server)
        .await;

    let err = client.restart_application("ghost").await.unwrap_err();
    assert!(err.is_not_found(), "expected 404, got: {err:?}");
    assert!(err.to_string().contains("application not found"));
}

// ── Identity tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_whoami() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "anon",
            "is_anonymous": true
        })))
        .mount(&server)
        .await;

    let user = client.whoami().await.unwrap();
    assert_eq!(user.id, "anon");
    assert!(user.is_anonymous);
    assert!(user.display_name.is_empty());
}

// ── Log stream tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_log_stream_delivers_open_then_messages() {
    let (server, client) = setup().await;

    let body = "data: {\"timestamp\":\"2026-01-01T10:00:00Z\",\"message\":\"hello\"}\n\n\
                : keep-alive\n\n\
                data: plain line\n\n";

    Mock::given(method("GET"))
        .and(path("/api/v1/apps/web/logs"))
        .and(query_param("stream", "true"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let reconnect = ReconnectConfig {
        initial_delay: Duration::from_secs(60),
        max_delay: Duration::from_secs(60),
        max_retries: Some(0),
    };
    let mut handle = client.open_log_stream("web", reconnect).unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), handle.next())
        .await
        .unwrap();
    assert_eq!(first, Some(StreamEvent::Open));

    let second = tokio::time::timeout(Duration::from_secs(5), handle.next())
        .await
        .unwrap();
    assert_eq!(
        second,
        Some(StreamEvent::Message(
            "{\"timestamp\":\"2026-01-01T10:00:00Z\",\"message\":\"hello\"}".into()
        ))
    );

    let third = tokio::time::timeout(Duration::from_secs(5), handle.next())
        .await
        .unwrap();
    assert_eq!(third, Some(StreamEvent::Message("plain line".into())));

    // Body ends: the stream reports the break, then gives up (max_retries = 0).
    let fourth = tokio::time::timeout(Duration::from_secs(5), handle.next())
        .await
        .unwrap();
    assert!(matches!(fourth, Some(StreamEvent::Error(_))));

    let end = tokio::time::timeout(Duration::from_secs(5), handle.next())
        .await
        .unwrap();
    assert_eq!(end, None);
}

#[tokio::test]
async fn test_log_stream_rejected_reports_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/apps/web/logs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let reconnect = ReconnectConfig {
        max_retries: Some(0),
        ..ReconnectConfig::default()
    };
    let mut handle = client.open_log_stream("web", reconnect).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), handle.next())
        .await
        .unwrap();
    assert!(
        matches!(event, Some(StreamEvent::Error(ref msg)) if msg.contains("503")),
        "expected Error event, got: {event:?}"
    );
}
