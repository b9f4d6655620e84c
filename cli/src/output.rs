// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rendering for command results: human text, tables, or JSON/YAML for scripts.
//!
//! Data goes to stdout. Warnings, errors and spinners go to stderr.

use alerts::{AlertStatus, FailureKind, Severity};
use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    #[value(alias = "text")]
    Plain,
    Json,
    #[value(alias = "yml")]
    Yaml,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    /// Same names the `--output` flag accepts, used for `output.format` in config
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| format!("Unknown output format '{}' (plain, json, yaml, table)", s))
    }
}

/// Severity of a one-line notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Notice {
    Success,
    Warning,
    Error,
}

impl Notice {
    fn label(self) -> ColoredString {
        match self {
            Notice::Success => "Success:".green().bold(),
            Notice::Warning => "Warning:".yellow().bold(),
            Notice::Error => "Error:".red().bold(),
        }
    }
}

#[derive(Serialize)]
struct NoticeLine<'a> {
    status: Notice,
    message: &'a str,
}

/// Renders command results in the selected format
#[derive(Debug, Clone)]
pub struct Outputter {
    format: OutputFormat,
}

impl Outputter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Serialize `value`; YAML when asked for, JSON otherwise
    pub fn output<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        match self.format {
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
            _ => println!("{}", serde_json::to_string_pretty(value)?),
        }
        Ok(())
    }

    /// Configuration renders as TOML unless a machine format was requested
    pub fn output_config(&self, config: &Config) -> Result<()> {
        if self.is_machine_readable() {
            self.output(config)
        } else {
            println!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
    }

    pub fn success(&self, message: &str) -> Result<()> {
        self.notice(Notice::Success, message)
    }

    /// Warnings go to stderr so machine output on stdout stays parseable
    pub fn warn(&self, message: &str) -> Result<()> {
        self.notice(Notice::Warning, message)
    }

    pub fn error(&self, message: &str) -> Result<()> {
        self.notice(Notice::Error, message)
    }

    pub fn is_machine_readable(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Yaml)
    }

    fn notice(&self, status: Notice, message: &str) -> Result<()> {
        let line = render_notice(self.format, status, message)?;
        if status == Notice::Success {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
        Ok(())
    }
}

fn render_notice(format: OutputFormat, status: Notice, message: &str) -> Result<String> {
    let line = NoticeLine { status, message };
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(&line)?,
        OutputFormat::Yaml => serde_yaml::to_string(&line)?.trim_end().to_string(),
        OutputFormat::Plain | OutputFormat::Table => format!("{} {}", status.label(), message),
    })
}

/// Spinner on stderr while the backend is working; hidden for machine formats
pub struct Spinner(ProgressBar);

impl Spinner {
    pub fn start(format: OutputFormat, message: &str) -> Self {
        if Outputter::new(format).is_machine_readable() {
            return Self(ProgressBar::hidden());
        }
        let bar = ProgressBar::new_spinner().with_message(message.to_string());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self(bar)
    }

    pub fn finish(self) {
        self.0.finish_and_clear();
    }
}

/// Format a duration in human-readable form
pub fn format_duration(millis: u64) -> String {
    if millis < 1000 {
        format!("{} ms", millis)
    } else if millis < 60_000 {
        format!("{:.1} s", millis as f64 / 1000.0)
    } else {
        let minutes = millis / 60_000;
        let seconds = (millis % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

/// Print a horizontal separator
pub fn separator() {
    println!("{}", "─".repeat(60));
}

/// Print a section header
pub fn section_header(title: &str) {
    println!();
    println!("{}", title.bold());
    separator();
}

/// Print a key-value pair
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Severity label colored the way the console renders it
pub fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.as_str();
    match severity {
        Severity::Critical => label.magenta().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.cyan(),
    }
}

pub fn status_label(status: AlertStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        AlertStatus::New => label.bold(),
        AlertStatus::Investigating => label.yellow(),
        AlertStatus::Resolved => label.green(),
        AlertStatus::FalsePositive => label.dimmed(),
    }
}

pub fn failure_label(kind: FailureKind) -> ColoredString {
    match kind {
        FailureKind::Transport => "transport".yellow(),
        FailureKind::Rejected => "rejected".red(),
        FailureKind::NotFound => "not found".dimmed(),
    }
}

/// Shorten `text` to at most `max` characters
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
