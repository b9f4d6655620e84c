// SPDX-License-Identifier: PMPL-1.0-or-later
//! Alert, incident and dashboard payload types
//!
//! These mirror the JSON the backend serves. Field names on the wire are
//! camelCase; the Rust side uses snake_case with serde renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Alert severity, ordered by escalation rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "Unknown severity: {}. Valid values: low, medium, high, critical",
                other
            )),
        }
    }
}

/// Triage status of an alert. The only field the console ever changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    New,
    Investigating,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::New => "new",
            AlertStatus::Investigating => "investigating",
            AlertStatus::Resolved => "resolved",
            AlertStatus::FalsePositive => "false_positive",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "new" => Ok(AlertStatus::New),
            "investigating" => Ok(AlertStatus::Investigating),
            "resolved" => Ok(AlertStatus::Resolved),
            "false_positive" => Ok(AlertStatus::FalsePositive),
            other => Err(format!(
                "Unknown alert status: {}. Valid values: new, investigating, resolved, false_positive",
                other
            )),
        }
    }
}

/// Optional enrichment attached to an alert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A single detected security event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: String,
    pub source: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub alert_type: String,
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<AlertMetadata>,
}

impl AlertRecord {
    /// MITRE ATT&CK tactic most commonly associated with this alert type
    pub fn tactic(&self) -> Option<&'static str> {
        tactic_for_type(&self.alert_type)
    }
}

/// Map an alert type to the tactic shown next to it in the console
pub fn tactic_for_type(alert_type: &str) -> Option<&'static str> {
    match alert_type {
        "brute_force" => Some("Credential Access"),
        "unauthorized_access" | "intrusion" | "phishing" => Some("Initial Access"),
        "malware" => Some("Execution"),
        "ransomware" => Some("Impact"),
        "privilege_escalation" => Some("Privilege Escalation"),
        "data_exfiltration" => Some("Exfiltration"),
        _ => None,
    }
}

/// Incident lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentStatus::Open => write!(f, "open"),
            IncidentStatus::InProgress => write!(f, "in_progress"),
            IncidentStatus::Resolved => write!(f, "resolved"),
            IncidentStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "open" => Ok(IncidentStatus::Open),
            "in_progress" => Ok(IncidentStatus::InProgress),
            "resolved" => Ok(IncidentStatus::Resolved),
            "closed" => Ok(IncidentStatus::Closed),
            other => Err(format!(
                "Unknown incident status: {}. Valid values: open, in_progress, resolved, closed",
                other
            )),
        }
    }
}

/// Higher-level grouping of alerts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: IncidentStatus,
    #[serde(default)]
    pub alerts: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Dashboard payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

/// Condensed alert row in the overview's recent list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAlert {
    pub id: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(rename = "type", default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_alerts: u64,
    pub last24h_alerts: u64,
    #[serde(default)]
    pub severity: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_sources: Vec<SourceCount>,
    #[serde(default)]
    pub recent_alerts: Vec<RecentAlert>,
    #[serde(default)]
    pub incidents: BTreeMap<String, u64>,
}

impl OverviewStats {
    pub fn incident_count(&self, status: IncidentStatus) -> u64 {
        self.incidents
            .get(&status.to_string())
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub ts: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesData {
    pub start: String,
    pub bucket: String,
    #[serde(default)]
    pub points: Vec<TimeseriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSegment {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub standard: String,
    #[serde(default)]
    pub segments: Vec<ComplianceSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitreTactics {
    #[serde(default)]
    pub tactics: Vec<TacticCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FimEvent {
    pub time: String,
    pub path: String,
    pub action: String,
    #[serde(default)]
    pub rule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FimRecent {
    #[serde(default)]
    pub events: Vec<FimEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaScan {
    pub policy: String,
    pub ended_at: String,
    pub passed: u64,
    pub failed: u64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaLatest {
    #[serde(default)]
    pub scans: Vec<ScaScan>,
}
