// SPDX-License-Identifier: PMPL-1.0-or-later
//! Bulk orchestrator tests against a scripted backend

use alerts::{
    AlertMutation, AlertStatus, BulkActionOrchestrator, BulkOutcome, FailureKind, Severity,
};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{alert, setup_test_logging, Script, ScriptedBackend};

fn backend(ids: &[&str]) -> Arc<ScriptedBackend> {
    Arc::new(ScriptedBackend::new(
        ids.iter()
            .map(|id| alert(id, Severity::High, "malware", "edr"))
            .collect(),
    ))
}

#[tokio::test]
async fn test_one_failure_does_not_affect_others() {
    setup_test_logging();
    let backend = backend(&["a", "b", "c"]);
    backend.script_alert("b", Script::Rejected);

    let orchestrator = BulkActionOrchestrator::new(backend.clone());
    let report = orchestrator
        .execute(["a", "b", "c"], AlertMutation::Status(AlertStatus::Resolved))
        .await;

    assert_eq!(report.results.len(), 3);
    let targets: Vec<&str> = report.results.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["a", "b", "c"]);
    assert!(report.results[0].is_success());
    assert_eq!(report.results[1].failure_kind(), Some(FailureKind::Rejected));
    assert!(report.results[2].is_success());

    assert_eq!(report.succeeded_targets(), vec!["a", "c"]);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(
        report.mutation,
        Some(AlertMutation::Status(AlertStatus::Resolved))
    );

    let mut updated: Vec<String> = backend.updated_ids().into_iter().collect();
    updated.sort();
    assert_eq!(updated, vec!["a", "c"]);
}

#[tokio::test]
async fn test_empty_targets_make_no_calls() {
    let backend = backend(&["a"]);
    let orchestrator = BulkActionOrchestrator::new(backend.clone());

    let report = orchestrator
        .execute(Vec::<String>::new(), AlertMutation::Status(AlertStatus::Investigating))
        .await;

    assert!(report.is_empty());
    assert!(report.all_succeeded());
    assert!(!report.all_failed());
    assert!(backend.updates().is_empty());
}

#[tokio::test]
async fn test_duplicate_targets_collapse() {
    let backend = backend(&["a", "b"]);
    let orchestrator = BulkActionOrchestrator::new(backend.clone());

    let report = orchestrator
        .execute(["b", "a", "b"], AlertMutation::Status(AlertStatus::FalsePositive))
        .await;

    assert_eq!(report.summary.total, 2);
    let targets: Vec<&str> = report.results.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["b", "a"]);
    assert_eq!(backend.updates().len(), 2);
}

#[tokio::test]
async fn test_failure_kinds_are_distinguished() {
    let backend = backend(&["ok", "gone", "bad", "slow"]);
    backend.script_alert("gone", Script::NotFound);
    backend.script_alert("bad", Script::Rejected);
    backend.script_alert("slow", Script::Transport);

    let report = BulkActionOrchestrator::new(backend)
        .execute(
            ["ok", "gone", "bad", "slow"],
            AlertMutation::Status(AlertStatus::Resolved),
        )
        .await;

    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.not_found, 1);
    assert_eq!(report.summary.rejected, 1);
    assert_eq!(report.summary.transport, 1);
    assert_eq!(report.not_found_targets(), vec!["gone"]);
    assert_eq!(report.retryable_targets(), vec!["slow"]);
}

#[tokio::test]
async fn test_hung_request_times_out_alone() {
    setup_test_logging();
    let backend = backend(&["a", "stuck", "c"]);
    backend.script_alert("stuck", Script::Hang);

    let orchestrator = BulkActionOrchestrator::new(backend.clone())
        .with_timeout(Duration::from_millis(50))
        .with_max_in_flight(2);
    let report = orchestrator
        .execute(["a", "stuck", "c"], AlertMutation::Status(AlertStatus::Resolved))
        .await;

    assert_eq!(report.summary.succeeded, 2);
    match &report.results[1].outcome {
        BulkOutcome::Failure(failure) => {
            assert_eq!(failure.kind, FailureKind::Transport);
            assert!(failure.reason.contains("timed out"));
        }
        BulkOutcome::Success => panic!("hung request reported as success"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_requests_run_concurrently() {
    setup_test_logging();
    let ids = ["h1", "h2", "h3", "h4"];
    let backend = backend(&ids);
    for id in ids {
        backend.script_alert(id, Script::Hang);
    }

    let timeout = Duration::from_secs(15);
    let orchestrator = BulkActionOrchestrator::new(backend.clone()).with_timeout(timeout);
    let start = tokio::time::Instant::now();
    let report = orchestrator
        .execute(ids, AlertMutation::Status(AlertStatus::Resolved))
        .await;
    let elapsed = start.elapsed();

    assert_eq!(report.summary.transport, 4);
    // Serial execution would take four timeouts
    assert!(elapsed >= timeout, "{:?}", elapsed);
    assert!(elapsed < timeout * 2, "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_limit_batches_requests() {
    let ids = ["h1", "h2", "h3", "h4"];
    let backend = backend(&ids);
    for id in ids {
        backend.script_alert(id, Script::Hang);
    }

    let timeout = Duration::from_secs(15);
    let start = tokio::time::Instant::now();
    let report = BulkActionOrchestrator::new(backend.clone())
        .with_timeout(timeout)
        .with_max_in_flight(2)
        .execute(ids, AlertMutation::Status(AlertStatus::Resolved))
        .await;
    let elapsed = start.elapsed();

    assert_eq!(report.summary.transport, 4);
    assert!(elapsed >= timeout * 2, "{:?}", elapsed);
    assert!(elapsed < timeout * 3, "{:?}", elapsed);
}

#[tokio::test]
async fn test_all_failed() {
    let backend = backend(&[]);
    let report = BulkActionOrchestrator::new(backend)
        .execute(["x", "y"], AlertMutation::Status(AlertStatus::Resolved))
        .await;

    assert!(report.all_failed());
    assert_eq!(report.not_found_targets(), vec!["x", "y"]);
}

#[tokio::test]
async fn test_report_serializes_for_cli_output() {
    let backend = backend(&["a"]);
    let report = BulkActionOrchestrator::new(backend)
        .execute(["a", "missing"], AlertMutation::Status(AlertStatus::Resolved))
        .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["mutation"]["field"], "status");
    assert_eq!(json["results"][0]["outcome"], "success");
    assert_eq!(json["results"][1]["kind"], "not_found");
    assert_eq!(json["summary"]["total"], 2);
}
