// SPDX-License-Identifier: PMPL-1.0-or-later
//! Incident commands.

use alerts::{AlertBackend, Incident, IncidentStatus};
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use super::Console;
use crate::config::Config;
use crate::exit_codes;
use crate::output::{OutputFormat, Outputter};

#[derive(Subcommand, Debug)]
pub enum IncidentsCommand {
    /// List incidents
    List {
        /// Maximum number of incidents
        #[arg(long, default_value = "100")]
        limit: u32,
    },

    /// Change the status of an incident
    Status {
        /// Incident ID
        id: String,
        /// New status (open, in_progress, resolved, closed)
        status: IncidentStatus,
    },
}

pub async fn execute(
    cmd: IncidentsCommand,
    console: &Console,
    config: &Config,
    format: OutputFormat,
) -> Result<i32> {
    let outputter = Outputter::new(format);
    let timeout = config.timeout();

    match cmd {
        IncidentsCommand::List { limit } => {
            let incidents = alerts::group::bounded(timeout, console.backend.list_incidents(limit))
                .await
                .context("Failed to load incidents")?;

            match format {
                OutputFormat::Json | OutputFormat::Yaml => outputter.output(&incidents)?,
                _ => print_incidents(&incidents),
            }
        }
        IncidentsCommand::Status { id, status } => {
            alerts::group::bounded(timeout, console.backend.update_incident_status(&id, status))
                .await
                .with_context(|| format!("Failed to update incident {}", id))?;
            outputter.success(&format!("Incident {} set to {}", id, status))?;
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn print_incidents(incidents: &[Incident]) {
    use tabled::{settings::Style, Table, Tabled};

    #[derive(Tabled)]
    struct IncidentRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Alerts")]
        alerts: usize,
        #[tabled(rename = "Created")]
        created: String,
    }

    if incidents.is_empty() {
        println!("No incidents.");
        return;
    }

    let rows: Vec<IncidentRow> = incidents
        .iter()
        .map(|i| IncidentRow {
            id: i.id.clone(),
            title: i.title.clone(),
            status: i.status.to_string(),
            alerts: i.alerts.as_ref().map_or(0, Vec::len),
            created: i
                .created_at
                .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    let open = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Open)
        .count();
    println!("\n{} open of {}", open.to_string().bold(), incidents.len());
}
