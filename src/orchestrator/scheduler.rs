//! Batch scheduling for one extraction run.
//!
//! # Run Shape
//!
//! ```text
//! upcoming: [b0][b1]...[bn]  ->  past: [b0]...[bm]
//!            |   ^
//!            |   +-- pause wait, then rate delay, at every boundary
//!            +------ up to `concurrentLimit` collections in flight
//! ```
//!
//! Categories run in [`Category::ORDER`]. Batch `k+1` is never dispatched
//! before every item of batch `k` has resolved, and a pause only takes
//! effect at a boundary, so the next batch after a resume is exactly the
//! one that would have run anyway.

use super::collector::{EventCollector, ItemOutcome};
use super::dedup::DedupStore;
use super::delay::RateDelay;
use super::limiter::ConcurrencyLimiter;
use super::pause::PauseController;
use super::progress::{ProgressTracker, category_percent};
use crate::config::RunConfig;
use crate::errors::HarvestError;
use crate::listing::dedupe;
use crate::models::{Category, EventLinks, EventRecord, ItemFailure, RunReport};
use crate::observer::RunObserver;
use crate::source::ItemSource;
use crate::storage::Persistence;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// A contiguous slice of one category's identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBatch {
    pub category: Category,
    /// Position within the category, from 0.
    pub index: usize,
    pub batches_in_category: usize,
    pub ids: Vec<String>,
}

/// Split the identifier lists into batches of `batch_size`, categories in order.
pub fn plan_batches(links: &EventLinks, batch_size: usize) -> Vec<PlannedBatch> {
    let batch_size = batch_size.max(1);
    let mut plan = Vec::new();
    for category in Category::ORDER {
        let ids = links.get(category);
        let batches_in_category = ids.len().div_ceil(batch_size);
        plan.extend(
            ids.chunks(batch_size)
                .enumerate()
                .map(|(index, chunk)| PlannedBatch {
                    category,
                    index,
                    batches_in_category,
                    ids: chunk.to_vec(),
                }),
        );
    }
    plan
}

/// Mutable state of the run in progress. Reset by every [`BatchScheduler::run`].
#[derive(Debug, Default)]
pub struct ExtractionRun {
    pub pending: EventLinks,
    /// Index (into the whole-run plan) of the next batch to dispatch.
    pub batch_index: usize,
    pub batches_total: usize,
    pub request_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub skipped_count: usize,
    pub processed_count: usize,
    pub records: Vec<EventRecord>,
    pub failures: Vec<ItemFailure>,
}

impl ExtractionRun {
    fn new(links: EventLinks) -> Self {
        Self {
            pending: links,
            ..Default::default()
        }
    }

    pub fn total(&self) -> usize {
        self.pending.total()
    }

    fn into_report(self) -> RunReport {
        RunReport {
            total: self.pending.total(),
            processed: self.processed_count,
            success: self.success_count,
            skipped: self.skipped_count,
            requests: self.request_count,
            batches: self.batches_total,
            failures: self.failures,
            records: self.records,
        }
    }
}

pub struct BatchScheduler<S, P, O> {
    config: RunConfig,
    collector: EventCollector<S, P>,
    observer: O,
    limiter: ConcurrencyLimiter,
    delay: RateDelay,
    pause: Arc<PauseController>,
    tracker: ProgressTracker,
    run: ExtractionRun,
}

impl<S, P, O> BatchScheduler<S, P, O>
where
    S: ItemSource,
    P: Persistence,
    O: RunObserver,
{
    /// Build a scheduler. The configuration is validated here, before any
    /// run state exists.
    pub fn new(
        config: RunConfig,
        source: S,
        store: DedupStore<P>,
        observer: O,
    ) -> Result<Self, HarvestError> {
        config.validate()?;
        let collector = EventCollector::new(
            source,
            store,
            config.settle(),
            config.item_timeout(),
            config.on_existing,
        );
        Ok(Self {
            limiter: ConcurrencyLimiter::new(config.concurrent_limit),
            delay: RateDelay::new(config.delay_min, config.delay_max),
            config,
            collector,
            observer,
            pause: Arc::new(PauseController::new()),
            tracker: ProgressTracker::new(),
            run: ExtractionRun::default(),
        })
    }

    /// Share an externally owned pause controller.
    #[cfg(test)]
    pub fn with_pause_controller(mut self, pause: Arc<PauseController>) -> Self {
        self.pause = pause;
        self
    }

    pub fn pause_handle(&self) -> Arc<PauseController> {
        Arc::clone(&self.pause)
    }

    #[cfg(test)]
    pub fn collector(&self) -> &EventCollector<S, P> {
        &self.collector
    }

    /// Process every identifier exactly once and return the run summary.
    ///
    /// Never fails: per-item problems come back in [`RunReport::failures`].
    #[instrument(level = "info", skip_all)]
    pub async fn run(&mut self, links: EventLinks) -> RunReport {
        let started = Instant::now();
        self.run = ExtractionRun::new(dedupe(links));
        self.tracker = ProgressTracker::new();
        self.pause.reset();

        let plan = plan_batches(&self.run.pending, self.config.batch_size);
        self.run.batches_total = plan.len();
        let total = self.run.total();
        info!(
            total,
            upcoming = self.run.pending.upcoming.len(),
            past = self.run.pending.past.len(),
            batches = plan.len(),
            batch_size = self.config.batch_size,
            concurrent_limit = self.limiter.limit(),
            "Starting extraction run"
        );

        for (n, batch) in plan.iter().enumerate() {
            if n > 0 {
                self.pause.wait_until_running().await;
                self.delay.wait().await;
            }

            self.observer.on_batch_dispatched(
                batch.category,
                batch.index,
                batch.batches_in_category,
                &batch.ids,
            );
            let collector = &self.collector;
            let outcomes = self
                .limiter
                .run_all(
                    batch
                        .ids
                        .iter()
                        .map(|id| collector.collect(id, batch.category)),
                )
                .await;

            for outcome in outcomes {
                self.record_outcome(outcome);
            }
            self.run.batch_index = n + 1;

            self.observer.on_progress(
                batch.category,
                category_percent(batch.index + 1, batch.batches_in_category),
            );
            self.observer.on_batch_complete(
                batch.category,
                self.run.processed_count,
                self.run.success_count,
            );
            let snapshot =
                self.tracker
                    .update(total, self.run.processed_count, self.run.success_count);
            self.observer.on_stats(&snapshot);
            debug!(
                category = %batch.category,
                batch = batch.index + 1,
                of = batch.batches_in_category,
                processed = self.run.processed_count,
                next = self.run.batch_index,
                remaining = self.run.batches_total - self.run.batch_index,
                "Batch resolved"
            );
        }

        self.pause.complete();
        let run = std::mem::take(&mut self.run);
        let report = run.into_report();
        info!(
            total = report.total,
            processed = report.processed,
            success = report.success,
            failed = report.failure_count(),
            skipped = report.skipped,
            success_rate = report.success_rate(),
            stored = self.collector.store().len().await,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction run complete"
        );
        report
    }

    fn record_outcome(&mut self, outcome: ItemOutcome) {
        let run = &mut self.run;
        run.processed_count += 1;
        if outcome.made_request() {
            run.request_count += 1;
        }
        match outcome {
            ItemOutcome::Stored(record) => {
                run.success_count += 1;
                run.records.push(record);
            }
            ItemOutcome::Skipped { .. } => {
                run.success_count += 1;
                run.skipped_count += 1;
            }
            ItemOutcome::Failed { failure, record } => {
                run.failure_count += 1;
                self.observer.on_failure(&failure);
                if let Some(record) = record {
                    run.records.push(record);
                }
                run.failures.push(failure);
            }
        }
        debug_assert_eq!(
            run.processed_count,
            run.success_count + run.failure_count
        );
    }
}
