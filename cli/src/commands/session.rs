// SPDX-License-Identifier: PMPL-1.0-or-later
//! Session token management.
//!
//! The token is kept in `<data_dir>/session.token`. Any command that gets a
//! 401 from the backend removes it.

use std::io::Read;
use std::path::Path;

use alerts::AlertBackend;
use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use super::{read_token, Console};
use crate::config::Config;
use crate::exit_codes;
use crate::output::{key_value, OutputFormat, Outputter};

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Store a bearer token (reads stdin when omitted)
    Set {
        /// Token value
        token: Option<String>,
    },

    /// Remove the stored token
    Clear,

    /// Show whether a token is stored
    Status {
        /// Also verify the token against the backend
        #[arg(long)]
        check: bool,
    },
}

#[derive(Serialize)]
struct SessionStatus {
    path: String,
    stored: bool,
    verified: Option<bool>,
}

pub async fn execute(cmd: SessionCommand, config: &Config, format: OutputFormat) -> Result<i32> {
    let outputter = Outputter::new(format);
    let path = config.session_file();

    match cmd {
        SessionCommand::Set { token } => {
            let token = match token {
                Some(token) => token,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read token from stdin")?;
                    buffer
                }
            };
            write_token(&path, token.trim())?;
            outputter.success(&format!("Session stored at {}", path.display()))?;
        }
        SessionCommand::Clear => {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
            outputter.success("Session cleared")?;
        }
        SessionCommand::Status { check } => {
            let stored = read_token(&path)?.is_some();
            let verified = if check && stored {
                let console = Console::connect(config)?;
                let ok = alerts::group::bounded(config.timeout(), console.backend.overview())
                    .await
                    .is_ok();
                console.sync_session().await?;
                Some(ok)
            } else {
                None
            };

            let status = SessionStatus {
                path: path.display().to_string(),
                stored,
                verified,
            };
            if outputter.is_machine_readable() {
                outputter.output(&status)?;
            } else {
                key_value("path", &status.path);
                key_value("stored", &status.stored.to_string());
                if let Some(verified) = status.verified {
                    key_value("verified", &verified.to_string());
                }
            }
            if verified == Some(false) {
                return Ok(exit_codes::BACKEND_AUTH_ERROR);
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn write_token(path: &Path, token: &str) -> Result<()> {
    if token.is_empty() {
        anyhow::bail!("Refusing to store an empty token");
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    std::fs::write(path, format!("{}\n", token))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
