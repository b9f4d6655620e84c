// SPDX-License-Identifier: PMPL-1.0-or-later
//! Dashboard aggregation
//!
//! Six independent stats reads are combined into one all-or-nothing
//! [`AggregationSnapshot`]. State moves `Idle -> Loading -> Ready | Failed`
//! and is published on a `watch` channel.
//!
//! Each fetch cycle takes a sequence number when it starts. A cycle only
//! commits if no newer cycle has been started since, so a slow early
//! response can never overwrite the result of a later refresh.

use crate::client::{AlertBackend, TimeBucket, DEFAULT_TIMEOUT};
use crate::error::{ConsoleError, FailureKind};
use crate::group::bounded;
use crate::model::{
    ComplianceSummary, FimRecent, MitreTactics, OverviewStats, ScaLatest, TimeseriesData,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// The six reads behind the summary view, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardResource {
    Overview,
    Timeseries,
    Compliance,
    MitreTactics,
    FimRecent,
    ScaLatest,
}

impl DashboardResource {
    pub const ALL: [DashboardResource; 6] = [
        DashboardResource::Overview,
        DashboardResource::Timeseries,
        DashboardResource::Compliance,
        DashboardResource::MitreTactics,
        DashboardResource::FimRecent,
        DashboardResource::ScaLatest,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            DashboardResource::Overview => "stats/overview",
            DashboardResource::Timeseries => "stats/timeseries",
            DashboardResource::Compliance => "stats/compliance",
            DashboardResource::MitreTactics => "stats/mitre",
            DashboardResource::FimRecent => "stats/fim/recent",
            DashboardResource::ScaLatest => "stats/sca/latest",
        }
    }
}

impl std::fmt::Display for DashboardResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Fully populated dashboard data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationSnapshot {
    pub overview: OverviewStats,
    pub timeseries: TimeseriesData,
    pub compliance: ComplianceSummary,
    pub mitre: MitreTactics,
    pub fim: FimRecent,
    pub sca: ScaLatest,
}

/// The failure that collapsed a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationFailure {
    pub resource: DashboardResource,
    pub kind: FailureKind,
    pub message: String,
}

impl std::fmt::Display for AggregationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed ({}): {}", self.resource, self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationState {
    Idle,
    Loading { cycle: u64 },
    Ready { cycle: u64, snapshot: Arc<AggregationSnapshot> },
    Failed { cycle: u64, failure: AggregationFailure },
}

impl AggregationState {
    pub fn is_ready(&self) -> bool {
        matches!(self, AggregationState::Ready { .. })
    }

    pub fn cycle(&self) -> Option<u64> {
        match self {
            AggregationState::Idle => None,
            AggregationState::Loading { cycle }
            | AggregationState::Ready { cycle, .. }
            | AggregationState::Failed { cycle, .. } => Some(*cycle),
        }
    }

    pub fn snapshot(&self) -> Option<&Arc<AggregationSnapshot>> {
        match self {
            AggregationState::Ready { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}

/// What happened to a cycle's result
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The cycle was still the newest and its state was published
    Committed(AggregationState),
    /// A newer cycle started first; the result was discarded
    Superseded { cycle: u64, latest: u64 },
}

/// Time-series window requested for the trend widget
#[derive(Debug, Clone, Copy)]
pub struct TrendWindow {
    pub days: u32,
    pub bucket: TimeBucket,
}

impl Default for TrendWindow {
    fn default() -> Self {
        Self {
            days: 7,
            bucket: TimeBucket::Day,
        }
    }
}

/// Populates the summary view from six concurrent reads
pub struct AggregationFetcher {
    backend: Arc<dyn AlertBackend>,
    timeout: Duration,
    trend: TrendWindow,
    issued: AtomicU64,
    state: watch::Sender<AggregationState>,
}

impl AggregationFetcher {
    pub fn new(backend: Arc<dyn AlertBackend>) -> Self {
        let (state, _) = watch::channel(AggregationState::Idle);
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
            trend: TrendWindow::default(),
            issued: AtomicU64::new(0),
            state,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_trend_window(mut self, trend: TrendWindow) -> Self {
        self.trend = trend;
        self
    }

    pub fn state(&self) -> AggregationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregationState> {
        self.state.subscribe()
    }

    /// Initial load on mount; a no-op once any cycle has started
    pub async fn load(&self) -> Option<CycleOutcome> {
        if self.issued.load(Ordering::SeqCst) > 0 {
            return None;
        }
        Some(self.refresh().await)
    }

    /// Start a new cycle, superseding any that are still outstanding
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> CycleOutcome {
        let cycle = self.begin_cycle();
        info!(cycle, "Loading dashboard");
        let start = Instant::now();

        let result = self.fetch_all().await;
        let next = match result {
            Ok(snapshot) => AggregationState::Ready {
                cycle,
                snapshot: Arc::new(snapshot),
            },
            Err(failure) => {
                warn!(cycle, resource = %failure.resource, error = %failure.message, "Dashboard load failed");
                AggregationState::Failed { cycle, failure }
            }
        };

        let outcome = self.commit(cycle, next);
        match &outcome {
            CycleOutcome::Committed(state) => info!(
                cycle,
                ready = state.is_ready(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Dashboard cycle committed"
            ),
            CycleOutcome::Superseded { latest, .. } => {
                warn!(cycle, latest, "Discarding superseded dashboard cycle")
            }
        }
        outcome
    }

    fn begin_cycle(&self) -> u64 {
        let mut cycle = 0;
        // Numbering and the Loading transition happen under the channel lock
        // so commits observe them atomically.
        self.state.send_modify(|state| {
            cycle = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            *state = AggregationState::Loading { cycle };
        });
        cycle
    }

    fn commit(&self, cycle: u64, next: AggregationState) -> CycleOutcome {
        let mut latest = cycle;
        let committed = self.state.send_if_modified(|state| {
            latest = self.issued.load(Ordering::SeqCst);
            if latest != cycle {
                return false;
            }
            *state = next.clone();
            true
        });

        if committed {
            CycleOutcome::Committed(next)
        } else {
            CycleOutcome::Superseded { cycle, latest }
        }
    }

    async fn fetch_all(&self) -> Result<AggregationSnapshot, AggregationFailure> {
        let backend = &self.backend;
        let t = self.timeout;

        let (overview, timeseries, compliance, mitre, fim, sca) = tokio::join!(
            bounded(t, backend.overview()),
            bounded(t, backend.timeseries(self.trend.days, self.trend.bucket)),
            bounded(t, backend.compliance()),
            bounded(t, backend.mitre_tactics()),
            bounded(t, backend.fim_recent()),
            bounded(t, backend.sca_latest()),
        );

        Ok(AggregationSnapshot {
            overview: overview.map_err(|e| failure(DashboardResource::Overview, e))?,
            timeseries: timeseries.map_err(|e| failure(DashboardResource::Timeseries, e))?,
            compliance: compliance.map_err(|e| failure(DashboardResource::Compliance, e))?,
            mitre: mitre.map_err(|e| failure(DashboardResource::MitreTactics, e))?,
            fim: fim.map_err(|e| failure(DashboardResource::FimRecent, e))?,
            sca: sca.map_err(|e| failure(DashboardResource::ScaLatest, e))?,
        })
    }
}

fn failure(resource: DashboardResource, error: ConsoleError) -> AggregationFailure {
    AggregationFailure {
        resource,
        kind: error.kind(),
        message: error.to_string(),
    }
}
