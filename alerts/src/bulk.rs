// SPDX-License-Identifier: PMPL-1.0-or-later
//! Bulk alert mutations
//!
//! One PATCH per target, issued concurrently. Every request settles before
//! the report is produced, and one target's failure never affects another.
//! Nothing is retried here; [`BulkReport`] exposes the failed subsets so the
//! caller can decide.

use crate::client::{AlertBackend, DEFAULT_TIMEOUT};
use crate::error::{ConsoleError, FailureKind};
use crate::group::{bounded, settle_all};
use crate::model::AlertStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Default number of PATCH requests kept in flight at once
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// The single field change applied to every target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum AlertMutation {
    Status(AlertStatus),
}

impl AlertMutation {
    pub fn field(&self) -> &'static str {
        match self {
            AlertMutation::Status(_) => "status",
        }
    }

    pub fn value(&self) -> String {
        match self {
            AlertMutation::Status(status) => status.to_string(),
        }
    }
}

/// Why one target's mutation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl From<&ConsoleError> for BulkFailure {
    fn from(error: &ConsoleError) -> Self {
        Self {
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum BulkOutcome {
    Success,
    Failure(BulkFailure),
}

/// Outcome for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOperationResult {
    pub target: String,
    #[serde(flatten)]
    pub outcome: BulkOutcome,
}

impl BulkOperationResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BulkOutcome::Success)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            BulkOutcome::Success => None,
            BulkOutcome::Failure(f) => Some(f.kind),
        }
    }
}

/// Counts over a finished bulk run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub transport: usize,
    pub rejected: usize,
    pub not_found: usize,
}

/// Everything a bulk run produced, one entry per target in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    pub mutation: Option<AlertMutation>,
    pub results: Vec<BulkOperationResult>,
    pub summary: BulkSummary,
    pub duration_ms: u64,
}

impl BulkReport {
    fn new(mutation: AlertMutation, results: Vec<BulkOperationResult>, duration: Duration) -> Self {
        let mut summary = BulkSummary {
            total: results.len(),
            ..BulkSummary::default()
        };
        for result in &results {
            match result.failure_kind() {
                None => summary.succeeded += 1,
                Some(kind) => {
                    summary.failed += 1;
                    match kind {
                        FailureKind::Transport => summary.transport += 1,
                        FailureKind::Rejected => summary.rejected += 1,
                        FailureKind::NotFound => summary.not_found += 1,
                    }
                }
            }
        }

        Self {
            mutation: Some(mutation),
            results,
            summary,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn all_failed(&self) -> bool {
        !self.is_empty() && self.summary.succeeded == 0
    }

    pub fn succeeded_targets(&self) -> Vec<&str> {
        self.targets_where(|r| r.is_success())
    }

    pub fn failed_targets(&self) -> Vec<&str> {
        self.targets_where(|r| !r.is_success())
    }

    /// Targets whose failure was transport-level and may be re-attempted
    pub fn retryable_targets(&self) -> Vec<&str> {
        self.targets_where(|r| r.failure_kind() == Some(FailureKind::Transport))
    }

    /// Targets that disappeared between selection and execution
    pub fn not_found_targets(&self) -> Vec<&str> {
        self.targets_where(|r| r.failure_kind() == Some(FailureKind::NotFound))
    }

    fn targets_where(&self, keep: impl Fn(&BulkOperationResult) -> bool) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| keep(r))
            .map(|r| r.target.as_str())
            .collect()
    }
}

/// Applies one mutation to many alerts concurrently
#[derive(Clone)]
pub struct BulkActionOrchestrator {
    backend: Arc<dyn AlertBackend>,
    timeout: Duration,
    max_in_flight: usize,
}

impl BulkActionOrchestrator {
    pub fn new(backend: Arc<dyn AlertBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Apply `mutation` to every target and wait for all of them to settle
    ///
    /// Duplicate targets collapse to their first occurrence. An empty target
    /// list yields an empty report without touching the backend.
    #[instrument(skip(self, targets), fields(field = mutation.field(), value = %mutation.value()))]
    pub async fn execute<I, S>(&self, targets: I, mutation: AlertMutation) -> BulkReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let targets: Vec<String> = targets
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| seen.insert(id.clone()))
            .collect();

        if targets.is_empty() {
            return BulkReport::default();
        }

        info!(targets = targets.len(), "Starting bulk alert update");
        let start = Instant::now();

        let requests = targets.iter().map(|id| {
            let backend = self.backend.clone();
            let timeout = self.timeout;
            async move {
                match mutation {
                    AlertMutation::Status(status) => {
                        bounded(timeout, backend.update_alert_status(id, status)).await
                    }
                }
            }
        });
        let outcomes = settle_all(requests, self.max_in_flight).await;

        let results: Vec<BulkOperationResult> = targets
            .iter()
            .zip(outcomes)
            .map(|(target, outcome)| {
                let outcome = match outcome {
                    Ok(()) => BulkOutcome::Success,
                    Err(e) => {
                        warn!(target = %target, kind = %e.kind(), error = %e, "Alert update failed");
                        BulkOutcome::Failure(BulkFailure::from(&e))
                    }
                };
                BulkOperationResult {
                    target: target.clone(),
                    outcome,
                }
            })
            .collect();

        let report = BulkReport::new(mutation, results, start.elapsed());
        info!(
            succeeded = report.summary.succeeded,
            failed = report.summary.failed,
            duration_ms = report.duration_ms,
            "Bulk alert update complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(target: &str, kind: Option<FailureKind>) -> BulkOperationResult {
        BulkOperationResult {
            target: target.to_string(),
            outcome: match kind {
                None => BulkOutcome::Success,
                Some(kind) => BulkOutcome::Failure(BulkFailure {
                    kind,
                    reason: "boom".to_string(),
                }),
            },
        }
    }

    #[test]
    fn test_report_summary_counts() {
        let report = BulkReport::new(
            AlertMutation::Status(AlertStatus::Resolved),
            vec![
                result("a", None),
                result("b", Some(FailureKind::Transport)),
                result("c", Some(FailureKind::NotFound)),
                result("d", Some(FailureKind::Rejected)),
            ],
            Duration::from_millis(12),
        );

        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(report.summary.failed, 3);
        assert_eq!(report.retryable_targets(), vec!["b"]);
        assert_eq!(report.not_found_targets(), vec!["c"]);
        assert_eq!(report.failed_targets(), vec!["b", "c", "d"]);
        assert!(!report.all_succeeded());
        assert!(!report.all_failed());
    }

    #[test]
    fn test_result_serialization_shape() {
        let json = serde_json::to_value(result("b", Some(FailureKind::NotFound))).unwrap();
        assert_eq!(json["target"], "b");
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["kind"], "not_found");

        let mutation = serde_json::to_value(AlertMutation::Status(AlertStatus::FalsePositive)).unwrap();
        assert_eq!(mutation, serde_json::json!({"field": "status", "value": "false_positive"}));
    }
}
