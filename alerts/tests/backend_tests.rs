// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTTP backend tests with mock servers
//!
//! - Bearer authentication and credential invalidation on 401
//! - Status code mapping into the failure taxonomy
//! - Query parameters and request bodies
//! - Client-side timeout

use alerts::client::{AlertQuery, ClientConfig, TimeBucket};
use alerts::{
    AlertBackend, AlertStatus, ConsoleError, FailureKind, HttpBackend, IncidentStatus,
    SessionCredential, Severity,
};
use anyhow::Result;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::setup_test_logging;

fn alert_json(id: &str, severity: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "source": "wazuh",
        "severity": severity,
        "type": "brute_force",
        "status": "new",
        "description": "Multiple failed SSH logins",
        "createdAt": "2026-10-19T08:00:00Z",
        "metadata": {"ip": "10.0.0.7", "host": "bastion-1", "rule_id": 5712}
    })
}

fn backend(server: &MockServer, token: Option<&str>) -> HttpBackend {
    HttpBackend::with_base_url(
        &server.uri(),
        SessionCredential::new(token.map(str::to_string)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_list_alerts_sends_bearer_and_query() -> Result<()> {
    setup_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .and(header("Authorization", "Bearer test-token"))
        .and(query_param("limit", "50"))
        .and(query_param("severity", "critical"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![alert_json("a1", "critical")]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server, Some("test-token"));
    let alerts = backend
        .list_alerts(AlertQuery {
            limit: 50,
            severity: Some(Severity::Critical),
        })
        .await?;

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, "a1");
    assert_eq!(alerts[0].alert_type, "brute_force");
    let metadata = alerts[0].metadata.as_ref().unwrap();
    assert_eq!(metadata.host.as_deref(), Some("bastion-1"));
    assert!(metadata.extra.contains_key("rule_id"));
    Ok(())
}

#[tokio::test]
async fn test_no_severity_param_when_unfiltered() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .and(query_param("limit", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let alerts = backend(&server, None).list_alerts(AlertQuery::default()).await?;
    assert!(alerts.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].url.query().unwrap_or("").contains("severity"));
    assert!(requests[0].headers.get("authorization").is_none());
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_invalidates_credential() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stats/overview"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"detail": "expired"})),
        )
        .mount(&server)
        .await;

    let backend = backend(&server, Some("stale"));
    let credential = backend.credential().clone();

    let err = backend.overview().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Auth(_)));
    assert!(credential.is_invalidated().await);
    assert!(credential.token().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_patch_status_body_and_path() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/alerts/a%2F1/status"))
        .and(body_json(serde_json::json!({"status": "false_positive"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server, Some("t"))
        .update_alert_status("a/1", AlertStatus::FalsePositive)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_status_mapping() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/alerts/gone/status"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/alerts/bad/status"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"detail": "invalid transition"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/alerts/busy/status"))
        .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "7"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/alerts/boom/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let backend = backend(&server, Some("t"));

    let err = backend.update_alert_status("gone", AlertStatus::Resolved).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::NotFound);

    let err = backend.update_alert_status("bad", AlertStatus::Resolved).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Rejected);
    assert!(err.to_string().contains("invalid transition"));

    let err = backend.update_alert_status("busy", AlertStatus::Resolved).await.unwrap_err();
    assert!(matches!(err, ConsoleError::RateLimited(7)));

    let err = backend.update_alert_status("boom", AlertStatus::Resolved).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Unavailable(_)));
    assert_eq!(err.kind(), FailureKind::Transport);
    Ok(())
}

#[tokio::test]
async fn test_server_errors_are_retryable_and_forbidden_is_not() -> Result<()> {
    setup_test_logging();
    let server = MockServer::start().await;

    for (id, code) in [("a1", 502), ("a2", 503), ("a3", 504)] {
        Mock::given(method("PATCH"))
            .and(path(format!("/api/alerts/{}/status", id)))
            .respond_with(
                ResponseTemplate::new(code)
                    .set_body_json(serde_json::json!({"detail": "database unavailable"})),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("PATCH"))
        .and(path("/api/alerts/locked/status"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let backend = backend(&server, Some("t"));
    for id in ["a1", "a2", "a3"] {
        let err = backend.update_alert_status(id, AlertStatus::Resolved).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport, "{}", err);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("database unavailable"));
    }

    let err = backend.update_alert_status("locked", AlertStatus::Resolved).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Api(_)));
    assert!(!err.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_client_timeout_is_transport() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stats/sca/latest"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"scans": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(
        ClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(100),
            ..ClientConfig::default()
        },
        SessionCredential::default(),
    )?;

    let err = backend.sca_latest().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_is_transport() {
    let backend =
        HttpBackend::with_base_url("http://127.0.0.1:9", SessionCredential::default()).unwrap();
    let err = backend.mitre_tactics().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_stats_endpoints_deserialize() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stats/timeseries"))
        .and(query_param("days", "7"))
        .and(query_param("bucket", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "start": "2026-10-12T00:00:00Z",
            "bucket": "day",
            "points": [{"ts": "2026-10-12T00:00:00Z", "count": 3}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats/overview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "totalAlerts": 12,
            "last24hAlerts": 4,
            "severity": {"critical": 2, "low": 10},
            "topSources": [{"source": "wazuh", "count": 9}],
            "recentAlerts": [],
            "incidents": {"open": 3}
        })))
        .mount(&server)
        .await;

    let backend = backend(&server, None);
    let series = backend.timeseries(7, TimeBucket::Day).await?;
    assert_eq!(series.points[0].count, 3);

    let overview = backend.overview().await?;
    assert_eq!(overview.total_alerts, 12);
    assert_eq!(overview.incident_count(IncidentStatus::Open), 3);
    assert_eq!(overview.incident_count(IncidentStatus::Closed), 0);
    Ok(())
}
