// SPDX-License-Identifier: PMPL-1.0-or-later
//! Exit codes for the socdash CLI.
//!
//! Standardized exit codes for scripts driving the console headlessly.
//!
//! # Exit Code Categories
//!
//! | Range     | Category                  | Description                                    |
//! |-----------|---------------------------|------------------------------------------------|
//! | 0         | Success                   | Operation completed successfully               |
//! | 1-9       | General errors            | Configuration, argument, IO errors             |
//! | 20-29     | Backend errors            | Connection, auth, not found, rejected          |
//! | 30-39     | Dashboard errors          | Aggregation failed                             |
//! | 50-59     | Bulk operation results    | Partial failures in bulk status changes        |
//! | 100+      | Internal errors           | Unexpected errors, panics                      |

use alerts::{BulkReport, ConsoleError};
use serde::Serialize;

// ============================================================================
// SUCCESS
// ============================================================================

/// Operation completed successfully
pub const SUCCESS: i32 = 0;

// ============================================================================
// GENERAL ERRORS (1-9)
// ============================================================================

/// General/unspecified error
pub const GENERAL_ERROR: i32 = 1;

/// Invalid command line arguments
pub const INVALID_ARGUMENTS: i32 = 2;

/// Configuration file error (missing, invalid, or inaccessible)
pub const CONFIG_ERROR: i32 = 3;

/// Local IO error (session file, config file)
pub const IO_ERROR: i32 = 4;

/// Operation timed out
pub const TIMEOUT: i32 = 6;

// ============================================================================
// BACKEND ERRORS (20-29)
// ============================================================================

/// Backend unreachable
pub const BACKEND_CONNECTION_ERROR: i32 = 20;

/// Backend rejected the credential; the stored session was cleared
pub const BACKEND_AUTH_ERROR: i32 = 21;

/// Alert or incident not found
pub const NOT_FOUND: i32 = 22;

/// Backend refused the change
pub const REJECTED: i32 = 23;

/// Backend rate limit exceeded
pub const RATE_LIMITED: i32 = 24;

/// Unexpected backend response
pub const BACKEND_ERROR: i32 = 25;

// ============================================================================
// DASHBOARD ERRORS (30-39)
// ============================================================================

/// At least one dashboard resource failed to load
pub const DASHBOARD_FAILED: i32 = 30;

// ============================================================================
// BULK OPERATION RESULTS (50-59)
// ============================================================================

/// Bulk operation partially succeeded (some failures)
pub const PARTIAL_FAILURE: i32 = 50;

/// Bulk operation completely failed (all targets failed)
pub const TOTAL_FAILURE: i32 = 51;

/// No targets to process
pub const NO_ITEMS: i32 = 52;

// ============================================================================
// INTERNAL ERRORS (100+)
// ============================================================================

/// Internal error (panic, unexpected state)
pub const INTERNAL_ERROR: i32 = 100;

/// One documented exit code
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExitCodeInfo {
    pub code: i32,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

/// Every exit code, grouped by category
pub const CATALOG: &[ExitCodeInfo] = &[
    ExitCodeInfo { code: SUCCESS, name: "SUCCESS", description: "Operation completed successfully", category: "Success" },
    ExitCodeInfo { code: GENERAL_ERROR, name: "GENERAL_ERROR", description: "General/unspecified error", category: "General Errors" },
    ExitCodeInfo { code: INVALID_ARGUMENTS, name: "INVALID_ARGUMENTS", description: "Invalid command line arguments", category: "General Errors" },
    ExitCodeInfo { code: CONFIG_ERROR, name: "CONFIG_ERROR", description: "Configuration file error", category: "General Errors" },
    ExitCodeInfo { code: IO_ERROR, name: "IO_ERROR", description: "Local IO error (session or config file)", category: "General Errors" },
    ExitCodeInfo { code: TIMEOUT, name: "TIMEOUT", description: "Request timed out", category: "General Errors" },
    ExitCodeInfo { code: BACKEND_CONNECTION_ERROR, name: "BACKEND_CONNECTION_ERROR", description: "Backend unreachable", category: "Backend Errors" },
    ExitCodeInfo { code: BACKEND_AUTH_ERROR, name: "BACKEND_AUTH_ERROR", description: "Authentication failed; session cleared", category: "Backend Errors" },
    ExitCodeInfo { code: NOT_FOUND, name: "NOT_FOUND", description: "Alert or incident not found", category: "Backend Errors" },
    ExitCodeInfo { code: REJECTED, name: "REJECTED", description: "Backend rejected the change", category: "Backend Errors" },
    ExitCodeInfo { code: RATE_LIMITED, name: "RATE_LIMITED", description: "Backend rate limit exceeded", category: "Backend Errors" },
    ExitCodeInfo { code: BACKEND_ERROR, name: "BACKEND_ERROR", description: "Unexpected backend response", category: "Backend Errors" },
    ExitCodeInfo { code: DASHBOARD_FAILED, name: "DASHBOARD_FAILED", description: "Dashboard data could not be loaded", category: "Dashboard Errors" },
    ExitCodeInfo { code: PARTIAL_FAILURE, name: "PARTIAL_FAILURE", description: "Bulk update partially succeeded", category: "Bulk Results" },
    ExitCodeInfo { code: TOTAL_FAILURE, name: "TOTAL_FAILURE", description: "Bulk update completely failed", category: "Bulk Results" },
    ExitCodeInfo { code: NO_ITEMS, name: "NO_ITEMS", description: "No alerts to update", category: "Bulk Results" },
    ExitCodeInfo { code: INTERNAL_ERROR, name: "INTERNAL_ERROR", description: "Internal error (panic, unexpected state)", category: "Internal Errors" },
];

/// Get a human-readable description of an exit code
pub fn describe(code: i32) -> &'static str {
    CATALOG
        .iter()
        .find(|info| info.code == code)
        .map(|info| info.description)
        .unwrap_or("Unknown error")
}

/// Map a backend error to its exit code
pub fn from_console_error(error: &ConsoleError) -> i32 {
    match error {
        ConsoleError::Http(_) => BACKEND_CONNECTION_ERROR,
        ConsoleError::Timeout(_) => TIMEOUT,
        ConsoleError::Auth(_) => BACKEND_AUTH_ERROR,
        ConsoleError::NotFound(_) => NOT_FOUND,
        ConsoleError::Rejected(_) => REJECTED,
        ConsoleError::RateLimited(_) => RATE_LIMITED,
        ConsoleError::Unavailable(_) | ConsoleError::Api(_) | ConsoleError::Json(_) => {
            BACKEND_ERROR
        }
        ConsoleError::Config(_) => CONFIG_ERROR,
    }
}

/// Exit code for an error that escaped a command handler
pub fn from_anyhow(error: &anyhow::Error) -> i32 {
    if let Some(console) = error.downcast_ref::<ConsoleError>() {
        return from_console_error(console);
    }
    if error.downcast_ref::<std::io::Error>().is_some() {
        return IO_ERROR;
    }
    GENERAL_ERROR
}

/// Exit code summarizing a bulk run
pub fn from_bulk_report(report: &BulkReport) -> i32 {
    if report.is_empty() {
        NO_ITEMS
    } else if report.all_failed() {
        TOTAL_FAILURE
    } else if !report.all_succeeded() {
        PARTIAL_FAILURE
    } else {
        SUCCESS
    }
}
