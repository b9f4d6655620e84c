// SPDX-License-Identifier: PMPL-1.0-or-later
//! Fan-out helpers shared by the bulk orchestrator and the dashboard fetcher

use crate::error::{ConsoleError, Result};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;

/// Run `fut` with an upper bound; expiry becomes a transport failure
pub async fn bounded<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ConsoleError::Timeout(timeout)),
    }
}

/// Drive every future to completion and keep every outcome
///
/// Unlike a fail-fast join, an error in one branch neither cancels nor hides
/// the others. Outcomes are returned in input order; at most `max_in_flight`
/// branches are polled at once.
pub async fn settle_all<I, F, T>(futures: I, max_in_flight: usize) -> Vec<Result<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    stream::iter(futures)
        .buffered(max_in_flight.max(1))
        .collect()
        .await
}
