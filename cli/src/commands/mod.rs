// SPDX-License-Identifier: PMPL-1.0-or-later
//! Command implementations for the socdash CLI.
//!
//! Each submodule implements a specific CLI command with its own
//! arguments, validation, and execution logic. Handlers return the process
//! exit code on success.

pub mod alerts;
pub mod dashboard;
pub mod incidents;
pub mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::alerts::client::ClientConfig;
use ::alerts::{HttpBackend, SessionCredential};
use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::Config;

/// Connection to the console backend shared by the remote commands
pub struct Console {
    pub backend: Arc<HttpBackend>,
    credential: SessionCredential,
    session_file: PathBuf,
}

impl Console {
    /// Build the HTTP backend with the stored session token (config token wins)
    pub fn connect(config: &Config) -> Result<Self> {
        let session_file = config.session_file();
        let token = match &config.backend.token {
            Some(token) => Some(token.clone()),
            None => read_token(&session_file)?,
        };
        if token.is_none() {
            debug!("No session token; requests are unauthenticated");
        }

        let credential = SessionCredential::new(token);
        let backend = HttpBackend::new(
            ClientConfig {
                base_url: config.backend.url.clone(),
                timeout: config.timeout(),
                ..ClientConfig::default()
            },
            credential.clone(),
        )
        .context("Failed to create backend client")?;

        Ok(Self {
            backend: Arc::new(backend),
            credential,
            session_file,
        })
    }

    /// Drop the stored token if the backend rejected it during this run
    pub async fn sync_session(&self) -> Result<()> {
        if self.credential.is_invalidated().await && self.session_file.exists() {
            warn!(path = %self.session_file.display(), "Session rejected by backend; clearing");
            std::fs::remove_file(&self.session_file).with_context(|| {
                format!("Failed to remove session file: {}", self.session_file.display())
            })?;
        }
        Ok(())
    }
}

/// Read the session token file; missing or empty means no token
pub fn read_token(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    let token = content.trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}
