// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the alert console core

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u64),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

/// How a failed remote call is classified for callers deciding what to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network or timeout failure. Retryable in principle.
    Transport,
    /// The backend refused the request (bad transition, auth, rate limit).
    Rejected,
    /// The target no longer exists.
    NotFound,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Rejected => write!(f, "rejected"),
            FailureKind::NotFound => write!(f, "not_found"),
        }
    }
}

impl ConsoleError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ConsoleError::Http(e) if e.is_status() => FailureKind::Rejected,
            ConsoleError::Http(e) if e.is_decode() => FailureKind::Rejected,
            ConsoleError::Http(_) | ConsoleError::Timeout(_) | ConsoleError::Unavailable(_) => {
                FailureKind::Transport
            }
            ConsoleError::NotFound(_) => FailureKind::NotFound,
            ConsoleError::Json(_)
            | ConsoleError::Auth(_)
            | ConsoleError::Rejected(_)
            | ConsoleError::RateLimited(_)
            | ConsoleError::Api(_)
            | ConsoleError::Config(_) => FailureKind::Rejected,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Transport
    }
}
