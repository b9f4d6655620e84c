// SPDX-License-Identifier: PMPL-1.0-or-later
//! socdash CLI - Command-line client for the SOC alert console
//!
//! This CLI provides commands for:
//! - Listing and filtering alerts, changing their status one by one or in bulk
//! - Listing incidents and changing their status
//! - Loading the dashboard summary
//! - Managing the stored session token and configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod exit_codes;
mod output;

use commands::{dashboard, incidents, session, Console};
use config::Config;
use output::{OutputFormat, Outputter};

/// socdash - SOC alert console client
///
/// Filters alerts, applies bulk status changes and summarizes the
/// dashboard of a socdash backend.
#[derive(Parser)]
#[command(
    name = "socdash",
    version,
    about = "SOC alert console CLI",
    long_about = None,
    propagate_version = true,
    after_help = "Use 'socdash <command> --help' for more information about a command."
)]
struct Cli {
    /// Output format (json, yaml, table, or plain)
    #[arg(short, long, global = true, value_enum, env = "SOCDASH_OUTPUT")]
    output: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SOCDASH_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with alerts
    #[command(subcommand)]
    Alerts(commands::alerts::AlertsCommand),

    /// Work with incidents
    #[command(subcommand)]
    Incidents(incidents::IncidentsCommand),

    /// Load and summarize the dashboard
    ///
    /// Fetches overview, trend, compliance, MITRE, file integrity and
    /// configuration assessment data concurrently. Any failure blocks the
    /// whole summary.
    Dashboard(dashboard::DashboardArgs),

    /// Manage the stored session token
    #[command(subcommand)]
    Session(session::SessionCommand),

    /// Show or manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show version and build information
    Version,

    /// Show exit code documentation
    #[command(name = "exit-codes")]
    ExitCodes,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Initialize configuration file
    Init,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., backend.url)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
}

fn init_logging(verbose: u8, quiet: bool, configured: &str) {
    let filter = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => configured,
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbose >= 2).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path).and_then(Config::apply_env_vars),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    init_logging(cli.verbose, cli.quiet, &config.general.log_level);

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    let format = cli
        .output
        .unwrap_or_else(|| config.output.format.parse().unwrap_or_default());

    let code = match run(cli.command, &config, format).await {
        Ok(code) => code,
        Err(e) => {
            let _ = Outputter::new(format).error(&format!("{:#}", e));
            exit_codes::from_anyhow(&e)
        }
    };
    tracing::debug!(code, reason = exit_codes::describe(code), "Exiting");
    std::process::exit(code);
}

async fn run(command: Commands, config: &Config, format: OutputFormat) -> Result<i32> {
    // Dispatch to command handlers
    match command {
        Commands::Alerts(cmd) => {
            let console = Console::connect(config)?;
            let result = commands::alerts::execute(cmd, &console, config, format).await;
            console.sync_session().await?;
            result
        }
        Commands::Incidents(cmd) => {
            let console = Console::connect(config)?;
            let result = incidents::execute(cmd, &console, config, format).await;
            console.sync_session().await?;
            result
        }
        Commands::Dashboard(args) => {
            let console = Console::connect(config)?;
            let result = dashboard::execute(args, &console, config, format).await;
            console.sync_session().await?;
            result
        }
        Commands::Session(cmd) => session::execute(cmd, config, format).await,
        Commands::Config(cmd) => handle_config_command(cmd, config, format),
        Commands::Version => print_version_info(format),
        Commands::ExitCodes => print_exit_codes(format),
    }
}

fn handle_config_command(cmd: ConfigCommands, config: &Config, format: OutputFormat) -> Result<i32> {
    let outputter = Outputter::new(format);

    match cmd {
        ConfigCommands::Show => {
            outputter.output_config(config)?;
        }
        ConfigCommands::Init => {
            let path = Config::init_default()?;
            outputter.success(&format!("Configuration initialized at: {}", path.display()))?;
        }
        ConfigCommands::Set { key, value } => {
            let mut new_config = config.clone();
            new_config.set(&key, &value)?;
            new_config.save()?;
            outputter.success(&format!("Set {} = {}", key, value))?;
        }
        ConfigCommands::Get { key } => {
            if let Some(value) = config.get(&key) {
                println!("{}", value);
            } else {
                anyhow::bail!("Configuration key '{}' not found", key);
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn print_version_info(format: OutputFormat) -> Result<i32> {
    use serde::Serialize;

    #[derive(Serialize)]
    struct VersionInfo {
        name: &'static str,
        version: &'static str,
        git_commit: Option<&'static str>,
        build_date: Option<&'static str>,
        rust_version: &'static str,
        target: &'static str,
    }

    let info = VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        git_commit: option_env!("GIT_COMMIT"),
        build_date: option_env!("BUILD_DATE"),
        rust_version: env!("CARGO_PKG_RUST_VERSION"),
        target: env!("TARGET"),
    };

    let outputter = Outputter::new(format);

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            outputter.output(&info)?;
        }
        _ => {
            println!("{} {}", info.name, info.version);
            if let Some(commit) = info.git_commit {
                println!("Git commit: {}", commit);
            }
            if let Some(date) = info.build_date {
                println!("Build date: {}", date);
            }
            println!("Rust version: {}", info.rust_version);
            println!("Target: {}", info.target);
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn print_exit_codes(format: OutputFormat) -> Result<i32> {
    let outputter = Outputter::new(format);

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            outputter.output(&exit_codes::CATALOG)?;
        }
        _ => {
            println!("Exit Codes for socdash CLI");
            println!("==========================\n");

            let mut current_category = "";
            for info in exit_codes::CATALOG {
                if info.category != current_category {
                    if !current_category.is_empty() {
                        println!();
                    }
                    println!("{}:", info.category);
                    current_category = info.category;
                }
                println!("  {:3}  {:<26}  {}", info.code, info.name, info.description);
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
