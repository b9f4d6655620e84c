// SPDX-License-Identifier: PMPL-1.0-or-later
//! Alert commands: list, show, status and bulk status changes.

use std::collections::BTreeSet;

use alerts::{
    AlertRecord, AlertStatus, AlertsController, BulkOutcome, BulkReport, FilterCriteria, Severity,
    TimeRange, ViewCounts,
};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use super::Console;
use crate::config::Config;
use crate::exit_codes;
use crate::output::{
    failure_label, format_duration, key_value, section_header, severity_label, status_label,
    truncate, OutputFormat, Outputter, Spinner,
};

#[derive(Subcommand, Debug)]
pub enum AlertsCommand {
    /// List alerts visible under the given filters
    List(ListArgs),

    /// Show one alert in full
    Show {
        /// Alert ID
        id: String,
    },

    /// Change the status of one alert
    Status {
        /// Alert ID
        id: String,
        /// New status (new, investigating, resolved, false_positive)
        status: AlertStatus,
    },

    /// Change the status of many alerts at once
    ///
    /// Targets are either explicit IDs or every alert visible under the
    /// filters. Each alert is updated independently; failures are reported
    /// per alert.
    Bulk(BulkArgs),
}

/// Client-side and server-side filters shared by list and bulk
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only this severity (applied by the backend)
    #[arg(long)]
    pub severity: Option<Severity>,

    /// Only this alert type
    #[arg(long = "type")]
    pub alert_type: Option<String>,

    /// Only this source
    #[arg(long)]
    pub source: Option<String>,

    /// Only this status
    #[arg(long)]
    pub status: Option<AlertStatus>,

    /// Time window: all, 24h, 7d, 30d
    #[arg(long)]
    pub since: Option<TimeRange>,

    /// Case-insensitive match against the description
    #[arg(short, long)]
    pub search: Option<String>,

    /// Maximum number of alerts fetched
    #[arg(long)]
    pub limit: Option<u32>,
}

impl FilterArgs {
    pub fn criteria(&self, config: &Config) -> FilterCriteria {
        let mut criteria = FilterCriteria::new()
            .with_severity(self.severity)
            .with_status(self.status)
            .with_time_range(self.since.unwrap_or(config.alerts.default_time_range));
        if let Some(alert_type) = &self.alert_type {
            criteria = criteria.with_type(alert_type.as_str());
        }
        if let Some(source) = &self.source {
            criteria = criteria.with_source(source.as_str());
        }
        if let Some(term) = &self.search {
            criteria = criteria.with_search(term.as_str());
        }
        criteria
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct BulkArgs {
    /// New status for every target
    pub status: AlertStatus,

    /// Comma-separated alert IDs
    #[arg(long, value_delimiter = ',', required_unless_present = "all_visible", conflicts_with = "all_visible")]
    pub ids: Vec<String>,

    /// Target every alert visible under the filters
    #[arg(long)]
    pub all_visible: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Execute an alerts subcommand
pub async fn execute(
    cmd: AlertsCommand,
    console: &Console,
    config: &Config,
    format: OutputFormat,
) -> Result<i32> {
    match cmd {
        AlertsCommand::List(args) => list(args, console, config, format).await,
        AlertsCommand::Show { id } => show(&id, console, config, format).await,
        AlertsCommand::Status { id, status } => {
            set_status(&id, status, console, config, format).await
        }
        AlertsCommand::Bulk(args) => bulk(args, console, config, format).await,
    }
}

fn controller(console: &Console, config: &Config, filter: &FilterArgs) -> AlertsController {
    AlertsController::new(console.backend.clone())
        .with_limit(filter.limit.unwrap_or(config.alerts.limit))
        .with_timeout(config.timeout())
        .with_max_in_flight(config.bulk.max_in_flight)
        .with_criteria(filter.criteria(config))
}

#[derive(Serialize)]
struct AlertListing<'a> {
    criteria: &'a FilterCriteria,
    visible: usize,
    total: usize,
    types: BTreeSet<String>,
    sources: BTreeSet<String>,
    alerts: Vec<&'a AlertRecord>,
}

async fn list(args: ListArgs, console: &Console, config: &Config, format: OutputFormat) -> Result<i32> {
    let mut view = controller(console, config, &args.filter);

    let progress = Spinner::start(format, "Loading alerts...");
    let loaded = view.refresh().await;
    progress.finish();
    loaded.context("Failed to load alerts")?;

    let counts = view.counts();
    let outputter = Outputter::new(format);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            outputter.output(&AlertListing {
                criteria: view.criteria(),
                visible: counts.visible,
                total: counts.total,
                types: view.distinct_types(),
                sources: view.distinct_sources(),
                alerts: view.visible(),
            })?;
        }
        OutputFormat::Table => {
            print_alert_table(&view.visible());
            print_counts(counts);
        }
        OutputFormat::Plain => {
            print_alert_lines(&view.visible());
            print_counts(counts);
            key_value("types", &join(&view.distinct_types()));
            key_value("sources", &join(&view.distinct_sources()));
        }
    }

    Ok(exit_codes::SUCCESS)
}

async fn show(id: &str, console: &Console, config: &Config, format: OutputFormat) -> Result<i32> {
    let view = controller(console, config, &FilterArgs::default());
    let alert = view
        .alert_detail(id)
        .await
        .with_context(|| format!("Failed to load alert {}", id))?;

    let outputter = Outputter::new(format);
    if outputter.is_machine_readable() {
        outputter.output(&alert)?;
        return Ok(exit_codes::SUCCESS);
    }

    section_header(&format!("Alert {}", alert.id));
    key_value("severity", &severity_label(alert.severity).to_string());
    key_value("status", &status_label(alert.status).to_string());
    key_value("type", &alert.alert_type);
    if let Some(tactic) = alert.tactic() {
        key_value("tactic", tactic);
    }
    key_value("source", &alert.source);
    if let Some(created) = alert.created_at {
        key_value("created", &created.to_rfc3339());
    }
    if let Some(description) = &alert.description {
        key_value("description", description);
    }
    if let Some(metadata) = &alert.metadata {
        for (key, value) in [("ip", &metadata.ip), ("host", &metadata.host), ("user", &metadata.user)] {
            if let Some(value) = value {
                key_value(key, value);
            }
        }
        for (key, value) in &metadata.extra {
            key_value(key, &value.to_string());
        }
    }

    Ok(exit_codes::SUCCESS)
}

async fn set_status(
    id: &str,
    status: AlertStatus,
    console: &Console,
    config: &Config,
    format: OutputFormat,
) -> Result<i32> {
    let mut view = controller(console, config, &FilterArgs::default());
    view.update_status(id, status)
        .await
        .with_context(|| format!("Failed to update alert {}", id))?;

    Outputter::new(format).success(&format!("Alert {} set to {}", id, status))?;
    Ok(exit_codes::SUCCESS)
}

async fn bulk(args: BulkArgs, console: &Console, config: &Config, format: OutputFormat) -> Result<i32> {
    let mut view = controller(console, config, &args.filter);
    view.refresh().await.context("Failed to load alerts")?;

    let outputter = Outputter::new(format);
    if args.all_visible {
        view.select_all();
    } else {
        let ids: BTreeSet<&str> = args.ids.iter().map(String::as_str).collect();
        for id in ids {
            if !view.select(id) {
                outputter.warn(&format!("Alert {} is not visible under the filters; skipped", id))?;
            }
        }
    }

    let selected = view.counts().selected;
    if selected == 0 {
        outputter.warn("No alerts selected")?;
        return Ok(exit_codes::NO_ITEMS);
    }
    info!(selected, status = %args.status, "Running bulk status change");

    let progress = Spinner::start(format, &format!("Updating {} alerts...", selected));
    let outcome = view.bulk_update_status(args.status).await;
    progress.finish();

    if outputter.is_machine_readable() {
        outputter.output(&outcome.report)?;
    } else {
        print_bulk_report(&outcome.report);
        let retry = view.counts().selected;
        if retry > 0 {
            println!(
                "\n{} alert(s) failed in transit and may be retried.",
                retry.to_string().yellow()
            );
        }
    }

    if let Some(error) = &outcome.refresh {
        debug!(error = %error, "Re-fetch after bulk update failed");
        outputter.warn(&format!("Alerts could not be reloaded: {}", error))?;
    }

    Ok(exit_codes::from_bulk_report(&outcome.report))
}

fn print_alert_table(alerts: &[&AlertRecord]) {
    use tabled::{settings::Style, Table, Tabled};

    #[derive(Tabled)]
    struct AlertRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Severity")]
        severity: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Type")]
        alert_type: String,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Created")]
        created: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    if alerts.is_empty() {
        println!("No alerts match the current filters.");
        return;
    }

    let rows: Vec<AlertRow> = alerts
        .iter()
        .map(|a| AlertRow {
            id: a.id.clone(),
            severity: a.severity.to_string(),
            status: a.status.to_string(),
            alert_type: a.alert_type.clone(),
            source: a.source.clone(),
            created: a
                .created_at
                .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            description: truncate(a.description.as_deref().unwrap_or(""), 48),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

fn print_alert_lines(alerts: &[&AlertRecord]) {
    if alerts.is_empty() {
        println!("No alerts match the current filters.");
        return;
    }

    for a in alerts {
        println!(
            "{:<12} {:<9} {:<14} {:<22} {:<10} {}",
            a.id,
            severity_label(a.severity),
            status_label(a.status),
            a.alert_type,
            a.source,
            truncate(a.description.as_deref().unwrap_or(""), 60).dimmed()
        );
    }
}

fn print_counts(counts: ViewCounts) {
    println!(
        "\nShowing {} of {} alerts",
        counts.visible.to_string().bold(),
        counts.total
    );
}

fn print_bulk_report(report: &BulkReport) {
    section_header("Bulk Update");
    for result in &report.results {
        match &result.outcome {
            BulkOutcome::Success => println!("  {} {}", "✓".green(), result.target),
            BulkOutcome::Failure(failure) => println!(
                "  {} {} [{}] {}",
                "✗".red(),
                result.target,
                failure_label(failure.kind),
                failure.reason.dimmed()
            ),
        }
    }

    let s = &report.summary;
    println!(
        "\n{} succeeded, {} failed ({} transport, {} rejected, {} not found) in {}",
        s.succeeded.to_string().green(),
        s.failed.to_string().red(),
        s.transport,
        s.rejected,
        s.not_found,
        format_duration(report.duration_ms)
    );
}

fn join(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_to_criteria() {
        let config = Config::default();
        let args = FilterArgs {
            severity: Some(Severity::High),
            alert_type: Some("malware".into()),
            search: Some("".into()),
            ..FilterArgs::default()
        };

        let criteria = args.criteria(&config);
        assert_eq!(criteria.server_severity(), Some(Severity::High));
        assert_eq!(criteria.alert_type.as_deref(), Some("malware"));
        assert_eq!(criteria.search_term, None);
        assert_eq!(criteria.time_range, TimeRange::All);
    }

    #[test]
    fn test_default_time_range_from_config() {
        let mut config = Config::default();
        config.alerts.default_time_range = TimeRange::Last7Days;

        let criteria = FilterArgs::default().criteria(&config);
        assert_eq!(criteria.time_range, TimeRange::Last7Days);

        let explicit = FilterArgs {
            since: Some(TimeRange::All),
            ..FilterArgs::default()
        };
        assert_eq!(explicit.criteria(&config).time_range, TimeRange::All);
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&BTreeSet::new()), "-");
        let values: BTreeSet<String> = ["b", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join(&values), "a, b");
    }
}
