//! Progress and failure reporting surface.
//!
//! The scheduler reports everything a front end needs through
//! [`RunObserver`]: batch dispatch, per-category progress, per-batch
//! counters, run-level stats and per-identifier failures. The CLI uses
//! [`TracingObserver`], which turns each callback into a log line.

use crate::models::{Category, ItemFailure};
use crate::orchestrator::progress::ProgressSnapshot;
use tracing::{info, warn};

pub trait RunObserver {
    /// A batch is about to be handed to the collector.
    fn on_batch_dispatched(
        &self,
        _category: Category,
        _batch_index: usize,
        _batches_in_category: usize,
        _ids: &[String],
    ) {
    }

    /// Category progress after a batch resolved, in percent.
    fn on_progress(&self, category: Category, percent: f64);

    /// Run-level counters after a batch resolved.
    fn on_batch_complete(&self, category: Category, processed: usize, success: usize);

    /// Emitted exactly once per failed identifier.
    fn on_failure(&self, failure: &ItemFailure);

    fn on_stats(&self, _snapshot: &ProgressSnapshot) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_batch_dispatched(
        &self,
        category: Category,
        batch_index: usize,
        batches_in_category: usize,
        ids: &[String],
    ) {
        info!(
            %category,
            batch = batch_index + 1,
            of = batches_in_category,
            size = ids.len(),
            "Dispatching batch"
        );
    }

    fn on_progress(&self, category: Category, percent: f64) {
        info!(%category, percent = %format!("{percent:.0}%"), "Category progress");
    }

    fn on_batch_complete(&self, category: Category, processed: usize, success: usize) {
        info!(%category, processed, success, "Batch complete");
    }

    fn on_failure(&self, failure: &ItemFailure) {
        warn!(
            id = %failure.id,
            category = %failure.category,
            kind = %failure.kind,
            reason = %failure.reason,
            "Event failed"
        );
    }

    fn on_stats(&self, snapshot: &ProgressSnapshot) {
        info!(
            total = snapshot.total,
            processed = snapshot.processed,
            success_rate = %format!("{}%", snapshot.success_rate),
            "Run progress"
        );
    }
}
