// SPDX-License-Identifier: PMPL-1.0-or-later
//! Dashboard command: one aggregation cycle, rendered as a summary.
//!
//! The summary is all-or-nothing. If any of the six reads fails, nothing is
//! shown except the failing resource.

use alerts::client::TimeBucket;
use alerts::{AggregationFetcher, AggregationSnapshot, AggregationState, CycleOutcome, TrendWindow};
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;

use super::Console;
use crate::config::Config;
use crate::exit_codes;
use crate::output::{key_value, section_header, separator, OutputFormat, Outputter, Spinner};

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Days covered by the alert trend
    #[arg(long, default_value = "7")]
    pub days: u32,

    /// Trend bucket width
    #[arg(long, value_enum, default_value = "day")]
    pub bucket: BucketArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BucketArg {
    Hour,
    Day,
}

impl From<BucketArg> for TimeBucket {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Hour => TimeBucket::Hour,
            BucketArg::Day => TimeBucket::Day,
        }
    }
}

pub async fn execute(
    args: DashboardArgs,
    console: &Console,
    config: &Config,
    format: OutputFormat,
) -> Result<i32> {
    let fetcher = AggregationFetcher::new(console.backend.clone())
        .with_timeout(config.timeout())
        .with_trend_window(TrendWindow {
            days: args.days,
            bucket: args.bucket.into(),
        });

    let progress = Spinner::start(format, "Loading dashboard...");
    let outcome = fetcher.load().await;
    progress.finish();

    let state = match outcome {
        Some(CycleOutcome::Committed(state)) => state,
        _ => fetcher.state(),
    };

    let outputter = Outputter::new(format);
    match state {
        AggregationState::Ready { snapshot, .. } => {
            if outputter.is_machine_readable() {
                outputter.output(snapshot.as_ref())?;
            } else {
                print_snapshot(&snapshot);
            }
            Ok(exit_codes::SUCCESS)
        }
        AggregationState::Failed { failure, .. } => {
            outputter.error(&format!("Dashboard unavailable: {}", failure))?;
            Ok(exit_codes::DASHBOARD_FAILED)
        }
        AggregationState::Idle | AggregationState::Loading { .. } => {
            outputter.error("Dashboard load did not complete")?;
            Ok(exit_codes::INTERNAL_ERROR)
        }
    }
}

fn print_snapshot(snapshot: &AggregationSnapshot) {
    let overview = &snapshot.overview;

    section_header("Overview");
    key_value("total alerts", &overview.total_alerts.to_string());
    key_value("last 24h", &overview.last24h_alerts.to_string());
    for (severity, count) in &overview.severity {
        key_value(severity, &count.to_string());
    }
    for (status, count) in &overview.incidents {
        key_value(&format!("incidents {}", status), &count.to_string());
    }

    if !overview.top_sources.is_empty() {
        section_header("Top Sources");
        for source in &overview.top_sources {
            println!("  {:<24} {}", source.source, source.count);
        }
    }

    section_header(&format!("Alert Trend (per {})", snapshot.timeseries.bucket));
    let peak = snapshot
        .timeseries
        .points
        .iter()
        .map(|p| p.count)
        .max()
        .unwrap_or(0);
    for point in &snapshot.timeseries.points {
        let width = if peak == 0 { 0 } else { (point.count * 40 / peak) as usize };
        println!("  {:<22} {:>5} {}", point.ts, point.count, "█".repeat(width).cyan());
    }

    section_header(&format!("Compliance ({})", snapshot.compliance.standard));
    for segment in &snapshot.compliance.segments {
        println!("  {:<24} {:.1}", segment.label, segment.value);
    }

    section_header("MITRE ATT&CK Tactics");
    for tactic in &snapshot.mitre.tactics {
        println!("  {:<24} {}", tactic.name, tactic.count);
    }

    section_header("File Integrity (recent)");
    if snapshot.fim.events.is_empty() {
        println!("  {}", "no events".dimmed());
    }
    for event in &snapshot.fim.events {
        println!(
            "  {} {:<10} {}",
            event.time.dimmed(),
            event.action,
            event.path
        );
    }

    section_header("Configuration Assessment (latest)");
    for scan in &snapshot.sca.scans {
        let score = format!("{:.0}%", scan.score);
        let score = if scan.score >= 80.0 {
            score.green()
        } else if scan.score >= 50.0 {
            score.yellow()
        } else {
            score.red()
        };
        println!(
            "  {:<32} {} passed / {} failed  {}",
            scan.policy, scan.passed, scan.failed, score
        );
    }
    separator();
}
