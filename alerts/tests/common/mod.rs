// SPDX-License-Identifier: PMPL-1.0-or-later
//! Shared fixtures for the alerts integration tests

#![allow(dead_code)]

use alerts::client::{AlertBackend, AlertQuery, TimeBucket};
use alerts::model::{
    ComplianceSegment, ComplianceSummary, FimRecent, MitreTactics, OverviewStats, ScaLatest,
    TacticCount, TimeseriesData, TimeseriesPoint,
};
use alerts::{AlertRecord, AlertStatus, ConsoleError, DashboardResource, Incident, IncidentStatus, Result, Severity};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn setup_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .try_init();
}

pub fn alert(id: &str, severity: Severity, alert_type: &str, source: &str) -> AlertRecord {
    AlertRecord {
        id: id.to_string(),
        source: source.to_string(),
        severity,
        alert_type: alert_type.to_string(),
        status: AlertStatus::New,
        description: Some(format!("{} from {}", alert_type, source)),
        created_at: Some(Utc::now() - ChronoDuration::minutes(5)),
        metadata: None,
    }
}

/// How the scripted backend answers a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    NotFound,
    Rejected,
    Transport,
    /// Backend answered with a 5xx
    Unavailable,
    /// Never completes; only a caller-side timeout ends it
    Hang,
}

impl Script {
    async fn play<T>(self, resource: &str) -> Result<T> {
        match self {
            Script::NotFound => Err(ConsoleError::NotFound(resource.to_string())),
            Script::Rejected => Err(ConsoleError::Rejected(format!("{}: invalid transition", resource))),
            Script::Transport => Err(ConsoleError::Timeout(std::time::Duration::from_millis(1))),
            Script::Unavailable => Err(ConsoleError::Unavailable(format!(
                "HTTP 503 Service Unavailable on {}",
                resource
            ))),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// In-memory backend with per-target and per-resource scripted failures
#[derive(Default)]
pub struct ScriptedBackend {
    alerts: Mutex<Vec<AlertRecord>>,
    alert_scripts: Mutex<HashMap<String, Script>>,
    resource_scripts: Mutex<HashMap<DashboardResource, Script>>,
    updates: Mutex<Vec<(String, AlertStatus)>>,
    queries: Mutex<Vec<AlertQuery>>,
    list_failures: Mutex<Option<Script>>,
    overview_gate: Mutex<Option<Arc<Notify>>>,
    overview_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(alerts: Vec<AlertRecord>) -> Self {
        Self {
            alerts: Mutex::new(alerts),
            ..Self::default()
        }
    }

    pub fn script_alert(&self, id: &str, script: Script) {
        self.alert_scripts.lock().unwrap().insert(id.to_string(), script);
    }

    pub fn script_resource(&self, resource: DashboardResource, script: Script) {
        self.resource_scripts.lock().unwrap().insert(resource, script);
    }

    pub fn fail_listing(&self, script: Option<Script>) {
        *self.list_failures.lock().unwrap() = script;
    }

    /// Hold the next overview call until `gate` is notified
    pub fn hold_next_overview(&self, gate: Arc<Notify>) {
        *self.overview_gate.lock().unwrap() = Some(gate);
    }

    pub fn remove_alert(&self, id: &str) {
        self.alerts.lock().unwrap().retain(|a| a.id != id);
    }

    pub fn updates(&self) -> Vec<(String, AlertStatus)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn updated_ids(&self) -> HashSet<String> {
        self.updates().into_iter().map(|(id, _)| id).collect()
    }

    pub fn queries(&self) -> Vec<AlertQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn overview_calls(&self) -> usize {
        self.overview_calls.load(Ordering::SeqCst)
    }

    fn resource_script(&self, resource: DashboardResource) -> Option<Script> {
        self.resource_scripts.lock().unwrap().get(&resource).copied()
    }
}

#[async_trait]
impl AlertBackend for ScriptedBackend {
    async fn list_alerts(&self, query: AlertQuery) -> Result<Vec<AlertRecord>> {
        self.queries.lock().unwrap().push(query);
        let failure = *self.list_failures.lock().unwrap();
        if let Some(script) = failure {
            return script.play("alerts").await;
        }
        let alerts = self.alerts.lock().unwrap().clone();
        Ok(alerts
            .into_iter()
            .filter(|a| query.severity.map_or(true, |s| a.severity == s))
            .take(query.limit as usize)
            .collect())
    }

    async fn get_alert(&self, id: &str) -> Result<AlertRecord> {
        let found = self.alerts.lock().unwrap().iter().find(|a| a.id == id).cloned();
        found.ok_or_else(|| ConsoleError::NotFound(format!("alerts/{}", id)))
    }

    async fn update_alert_status(&self, id: &str, status: AlertStatus) -> Result<()> {
        let script = self.alert_scripts.lock().unwrap().get(id).copied();
        if let Some(script) = script {
            return script.play(&format!("alerts/{}/status", id)).await;
        }
        {
            let mut alerts = self.alerts.lock().unwrap();
            match alerts.iter_mut().find(|a| a.id == id) {
                Some(a) => a.status = status,
                None => return Err(ConsoleError::NotFound(format!("alerts/{}/status", id))),
            }
        }
        self.updates.lock().unwrap().push((id.to_string(), status));
        Ok(())
    }

    async fn list_incidents(&self, _limit: u32) -> Result<Vec<Incident>> {
        Ok(Vec::new())
    }

    async fn update_incident_status(&self, id: &str, _status: IncidentStatus) -> Result<()> {
        Err(ConsoleError::NotFound(format!("incidents/{}", id)))
    }

    async fn overview(&self) -> Result<OverviewStats> {
        self.overview_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.overview_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(script) = self.resource_script(DashboardResource::Overview) {
            return script.play("stats/overview").await;
        }
        let total = self.alerts.lock().unwrap().len() as u64;
        Ok(OverviewStats {
            total_alerts: total,
            last24h_alerts: total,
            severity: BTreeMap::from([("critical".to_string(), 1)]),
            top_sources: Vec::new(),
            recent_alerts: Vec::new(),
            incidents: BTreeMap::from([("open".to_string(), 2)]),
        })
    }

    async fn timeseries(&self, _days: u32, bucket: TimeBucket) -> Result<TimeseriesData> {
        if let Some(script) = self.resource_script(DashboardResource::Timeseries) {
            return script.play("stats/timeseries").await;
        }
        Ok(TimeseriesData {
            start: "2026-10-12T00:00:00Z".to_string(),
            bucket: bucket.as_str().to_string(),
            points: vec![TimeseriesPoint {
                ts: "2026-10-12T00:00:00Z".to_string(),
                count: 4,
            }],
        })
    }

    async fn compliance(&self) -> Result<ComplianceSummary> {
        if let Some(script) = self.resource_script(DashboardResource::Compliance) {
            return script.play("stats/compliance").await;
        }
        Ok(ComplianceSummary {
            standard: "PCI DSS".to_string(),
            segments: vec![ComplianceSegment {
                label: "Passed".to_string(),
                value: 80.0,
            }],
        })
    }

    async fn mitre_tactics(&self) -> Result<MitreTactics> {
        if let Some(script) = self.resource_script(DashboardResource::MitreTactics) {
            return script.play("stats/mitre").await;
        }
        Ok(MitreTactics {
            tactics: vec![TacticCount {
                name: "Initial Access".to_string(),
                count: 3,
            }],
        })
    }

    async fn fim_recent(&self) -> Result<FimRecent> {
        if let Some(script) = self.resource_script(DashboardResource::FimRecent) {
            return script.play("stats/fim/recent").await;
        }
        Ok(FimRecent { events: Vec::new() })
    }

    async fn sca_latest(&self) -> Result<ScaLatest> {
        if let Some(script) = self.resource_script(DashboardResource::ScaLatest) {
            return script.play("stats/sca/latest").await;
        }
        Ok(ScaLatest { scans: Vec::new() })
    }
}
