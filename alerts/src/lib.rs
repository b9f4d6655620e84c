// SPDX-License-Identifier: PMPL-1.0-or-later
//! Alert management and dashboard aggregation core for socdash
//!
//! Provides the stateful core of the SOC console:
//!
//! - **Filtering** - Conjunctive client-side predicates over a fetched alert collection
//! - **Selection** - Identifier set kept consistent with what is visible
//! - **Bulk actions** - Concurrent per-alert mutations with per-target outcomes
//! - **Aggregation** - Six concurrent stats reads combined into one dashboard snapshot
//!
//! All remote access goes through the [`AlertBackend`] trait; [`HttpBackend`]
//! talks to the console's REST API.
//!
//! # Example
//!
//! ```rust,no_run
//! use alerts::{AlertsController, AlertStatus, FilterCriteria, HttpBackend, SessionCredential, Severity};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credential = SessionCredential::new(Some("your-token".to_string()));
//!     let backend = Arc::new(HttpBackend::with_base_url("http://localhost:8000", credential)?);
//!
//!     let mut view = AlertsController::new(backend);
//!     view.refresh().await?;
//!     view.apply_criteria(FilterCriteria::new().with_severity(Some(Severity::Critical)))
//!         .await?;
//!
//!     // Resolve everything still visible
//!     view.select_all();
//!     let outcome = view.bulk_update_status(AlertStatus::Resolved).await;
//!     println!("{} updated", outcome.report.summary.succeeded);
//!
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod bulk;
pub mod client;
pub mod controller;
pub mod error;
pub mod filter;
pub mod group;
pub mod model;
pub mod selection;

pub use aggregation::{
    AggregationFailure, AggregationFetcher, AggregationSnapshot, AggregationState, CycleOutcome,
    DashboardResource, TrendWindow,
};
pub use bulk::{
    AlertMutation, BulkActionOrchestrator, BulkFailure, BulkOperationResult, BulkOutcome,
    BulkReport, BulkSummary,
};
pub use client::{AlertBackend, AlertQuery, ClientConfig, HttpBackend, SessionCredential, TimeBucket};
pub use controller::{AlertsController, BulkActionOutcome, ViewCounts};
pub use error::{ConsoleError, FailureKind, Result};
pub use filter::{FilterCriteria, FilterPipeline, TimeRange};
pub use model::{AlertRecord, AlertStatus, Incident, IncidentStatus, Severity};
pub use selection::SelectionSet;
