// SPDX-License-Identifier: PMPL-1.0-or-later
//! Client-side alert filtering
//!
//! A [`FilterCriteria`] value is turned into an ordered list of predicates
//! that are ANDed together. Evaluation borrows from the cached collection and
//! never reorders it.

use crate::model::{AlertRecord, AlertStatus, Severity};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Age window applied to `createdAt`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl TimeRange {
    /// Maximum age a record may have to stay visible; `None` for `all`
    pub fn threshold(&self) -> Option<Duration> {
        match self {
            TimeRange::All => None,
            TimeRange::Last24Hours => Some(Duration::hours(24)),
            TimeRange::Last7Days => Some(Duration::hours(24 * 7)),
            TimeRange::Last30Days => Some(Duration::hours(24 * 30)),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::All => write!(f, "all"),
            TimeRange::Last24Hours => write!(f, "24h"),
            TimeRange::Last7Days => write!(f, "7d"),
            TimeRange::Last30Days => write!(f, "30d"),
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(TimeRange::All),
            "24h" => Ok(TimeRange::Last24Hours),
            "7d" => Ok(TimeRange::Last7Days),
            "30d" => Ok(TimeRange::Last30Days),
            other => Err(format!(
                "Unknown time range: {}. Valid values: all, 24h, 7d, 30d",
                other
            )),
        }
    }
}

/// Immutable snapshot of the active filters
///
/// Every `with_*` method consumes the value and returns a new one, so the
/// only way to change what is visible is to hand the controller a new
/// criteria value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub severity: Option<Severity>,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub source: Option<String>,
    pub status: Option<AlertStatus>,
    pub time_range: TimeRange,
    pub search_term: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(mut self, severity: Option<Severity>) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_type(mut self, alert_type: impl Into<String>) -> Self {
        self.alert_type = non_empty(alert_type.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = non_empty(source.into());
        self
    }

    pub fn with_status(mut self, status: Option<AlertStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = non_empty(term.into());
        self
    }

    /// Severity the backend can apply server-side on `GET alerts`
    pub fn server_severity(&self) -> Option<Severity> {
        self.severity
    }

    /// True when no criterion would exclude anything
    pub fn is_unfiltered(&self) -> bool {
        self.severity.is_none()
            && active(&self.alert_type).is_none()
            && active(&self.source).is_none()
            && self.status.is_none()
            && self.time_range == TimeRange::All
            && active(&self.search_term).is_none()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Criteria fields may arrive through serde as `Some("")`; those are bypassed.
fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A single conjunct of the filter
pub type Predicate<'c> = Box<dyn Fn(&AlertRecord) -> bool + 'c>;

/// Derives the visible subset of a cached alert collection
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    criteria: FilterCriteria,
}

impl FilterPipeline {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Build the ordered predicate list for a pass whose clock reads `now`
    pub fn predicates(&self, now: DateTime<Utc>) -> Vec<Predicate<'_>> {
        let c = &self.criteria;
        let mut predicates: Vec<Predicate<'_>> = Vec::new();

        if let Some(severity) = c.severity {
            predicates.push(Box::new(move |a: &AlertRecord| a.severity == severity));
        }
        if let Some(alert_type) = active(&c.alert_type) {
            predicates.push(Box::new(move |a: &AlertRecord| a.alert_type == alert_type));
        }
        if let Some(source) = active(&c.source) {
            predicates.push(Box::new(move |a: &AlertRecord| a.source == source));
        }
        if let Some(status) = c.status {
            predicates.push(Box::new(move |a: &AlertRecord| a.status == status));
        }
        if let Some(term) = active(&c.search_term) {
            let needle = term.to_lowercase();
            predicates.push(Box::new(move |a: &AlertRecord| {
                a.description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            }));
        }
        if let Some(threshold) = c.time_range.threshold() {
            // Records without a timestamp have no age to exceed the window.
            predicates.push(Box::new(move |a: &AlertRecord| match a.created_at {
                Some(created) => now - created <= threshold,
                None => true,
            }));
        }

        predicates
    }

    /// Visible subsequence of `alerts` as of the current wall clock
    pub fn evaluate<'a>(&self, alerts: &'a [AlertRecord]) -> Vec<&'a AlertRecord> {
        self.evaluate_at(alerts, Utc::now())
    }

    /// Visible subsequence of `alerts` with a fixed cutoff clock
    pub fn evaluate_at<'a>(
        &self,
        alerts: &'a [AlertRecord],
        now: DateTime<Utc>,
    ) -> Vec<&'a AlertRecord> {
        let predicates = self.predicates(now);
        alerts
            .iter()
            .filter(|alert| predicates.iter().all(|p| p(*alert)))
            .collect()
    }

    /// Identifiers of the visible subset, in collection order
    pub fn visible_ids(&self, alerts: &[AlertRecord]) -> Vec<String> {
        self.evaluate(alerts)
            .into_iter()
            .map(|a| a.id.clone())
            .collect()
    }
}

/// Distinct `type` values across the full collection
pub fn distinct_types(alerts: &[AlertRecord]) -> BTreeSet<String> {
    alerts.iter().map(|a| a.alert_type.clone()).collect()
}

/// Distinct `source` values across the full collection
pub fn distinct_sources(alerts: &[AlertRecord]) -> BTreeSet<String> {
    alerts.iter().map(|a| a.source.clone()).collect()
}
