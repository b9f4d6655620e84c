// SPDX-License-Identifier: PMPL-1.0-or-later
//! Alert management view
//!
//! Ties the cached alert collection, the filter pipeline, the selection and
//! the bulk orchestrator together. The collection is only ever replaced
//! wholesale after a fetch, and the selection is reconciled against the
//! visible rows after every change to either the collection or the criteria.

use crate::bulk::{AlertMutation, BulkActionOrchestrator, BulkReport};
use crate::client::{AlertBackend, AlertQuery, DEFAULT_TIMEOUT};
use crate::error::{ConsoleError, Result};
use crate::filter::{self, FilterCriteria, FilterPipeline};
use crate::group::bounded;
use crate::model::{AlertRecord, AlertStatus};
use crate::selection::SelectionSet;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Row counts shown above the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewCounts {
    pub visible: usize,
    pub total: usize,
    pub selected: usize,
}

/// Result of a bulk status change
#[derive(Debug)]
pub struct BulkActionOutcome {
    pub report: BulkReport,
    /// Set when the re-fetch after the mutations failed
    pub refresh: Option<ConsoleError>,
}

pub struct AlertsController {
    backend: Arc<dyn AlertBackend>,
    orchestrator: BulkActionOrchestrator,
    timeout: Duration,
    limit: u32,
    pipeline: FilterPipeline,
    alerts: Arc<Vec<AlertRecord>>,
    selection: SelectionSet,
}

impl AlertsController {
    pub fn new(backend: Arc<dyn AlertBackend>) -> Self {
        Self {
            orchestrator: BulkActionOrchestrator::new(backend.clone()),
            backend,
            timeout: DEFAULT_TIMEOUT,
            limit: AlertQuery::default().limit,
            pipeline: FilterPipeline::default(),
            alerts: Arc::new(Vec::new()),
            selection: SelectionSet::new(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.orchestrator = self.orchestrator.with_timeout(timeout);
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.orchestrator = self.orchestrator.with_max_in_flight(max_in_flight);
        self
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.pipeline = FilterPipeline::new(criteria);
        self
    }

    pub fn criteria(&self) -> &FilterCriteria {
        self.pipeline.criteria()
    }

    /// The cached collection as last fetched
    pub fn alerts(&self) -> Arc<Vec<AlertRecord>> {
        self.alerts.clone()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Re-fetch the collection, pushing the severity filter down to the server
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<()> {
        let query = AlertQuery {
            limit: self.limit,
            severity: self.pipeline.criteria().server_severity(),
        };
        let alerts = bounded(self.timeout, self.backend.list_alerts(query)).await?;
        info!(count = alerts.len(), "Loaded alerts");

        self.alerts = Arc::new(alerts);
        self.reconcile();
        Ok(())
    }

    /// Replace the criteria; re-fetches only when the server-side part changed
    pub async fn apply_criteria(&mut self, criteria: FilterCriteria) -> Result<()> {
        let refetch = criteria.server_severity() != self.pipeline.criteria().server_severity();
        self.pipeline = FilterPipeline::new(criteria);
        self.reconcile();

        if refetch {
            self.refresh().await?;
        }
        Ok(())
    }

    pub fn visible(&self) -> Vec<&AlertRecord> {
        self.pipeline.evaluate(&self.alerts)
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.pipeline.visible_ids(&self.alerts)
    }

    pub fn counts(&self) -> ViewCounts {
        ViewCounts {
            visible: self.visible().len(),
            total: self.alerts.len(),
            selected: self.selection.len(),
        }
    }

    pub fn distinct_types(&self) -> BTreeSet<String> {
        filter::distinct_types(&self.alerts)
    }

    pub fn distinct_sources(&self) -> BTreeSet<String> {
        filter::distinct_sources(&self.alerts)
    }

    /// Toggle a visible row; returns false when `id` is not visible
    pub fn toggle(&mut self, id: &str) -> bool {
        if !self.visible().iter().any(|a| a.id == id) {
            debug!(id, "Ignoring toggle for hidden alert");
            return false;
        }
        self.selection.toggle(id);
        true
    }

    /// Select a visible row without ever deselecting it; false when hidden
    pub fn select(&mut self, id: &str) -> bool {
        if !self.visible().iter().any(|a| a.id == id) {
            debug!(id, "Ignoring selection of hidden alert");
            return false;
        }
        self.selection.insert(id);
        true
    }

    pub fn select_all(&mut self) {
        let visible = self.visible_ids();
        self.selection.select_all(&visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(&self.visible_ids())
    }

    /// Apply `status` to every selected alert
    ///
    /// Afterwards the collection is re-fetched. Targets that failed at the
    /// transport level and are still visible stay selected; everything else
    /// is deselected.
    #[instrument(skip(self), fields(selected = self.selection.len()))]
    pub async fn bulk_update_status(&mut self, status: AlertStatus) -> BulkActionOutcome {
        let targets = self.selection.targets();
        if targets.is_empty() {
            return BulkActionOutcome {
                report: BulkReport::default(),
                refresh: None,
            };
        }

        let report = self
            .orchestrator
            .execute(targets, AlertMutation::Status(status))
            .await;

        let refresh = self.refresh().await.err();
        let retry = report.retryable_targets();
        self.selection.select_all(&retry);
        self.reconcile();

        BulkActionOutcome { report, refresh }
    }

    /// Change one alert's status, then re-fetch
    pub async fn update_status(&mut self, id: &str, status: AlertStatus) -> Result<()> {
        bounded(self.timeout, self.backend.update_alert_status(id, status)).await?;
        info!(id, %status, "Alert status updated");
        self.refresh().await
    }

    pub async fn alert_detail(&self, id: &str) -> Result<AlertRecord> {
        bounded(self.timeout, self.backend.get_alert(id)).await
    }

    fn reconcile(&mut self) {
        let visible = self.pipeline.visible_ids(&self.alerts);
        let dropped = self.selection.reconcile(&visible);
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "Deselected hidden alerts");
        }
    }
}
