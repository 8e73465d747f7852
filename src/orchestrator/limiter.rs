//! Bounded concurrent execution of units of work.

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Runs a sequence of futures with at most `limit` in flight.
///
/// Units are started in submission order and a new one starts as soon as a
/// slot frees. Completion order is not preserved. Everything runs inside the
/// calling task: "concurrent" here means interleaved, not parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimiter {
    limit: usize,
}

impl ConcurrencyLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drive every unit to completion and collect their outputs.
    pub async fn run_all<I, F, T>(&self, units: I) -> Vec<T>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T>,
    {
        stream::iter(units)
            .buffer_unordered(self.limit)
            .collect()
            .await
    }
}
