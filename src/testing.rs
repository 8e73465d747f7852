//! Test doubles shared by the unit tests.

use crate::errors::BoxError;
use crate::models::{Category, EventRecord, ItemFailure, RawEventFields};
use crate::observer::RunObserver;
use crate::orchestrator::progress::ProgressSnapshot;
use crate::source::ItemSource;
use crate::storage::{MemoryStore, Persistence};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[derive(Debug, Default)]
struct MockStats {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    extractions: Mutex<Vec<String>>,
    forgotten: Mutex<Vec<String>>,
}

/// Scripted item source. Clones share call statistics.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    failing_navigation: HashSet<String>,
    flaky_navigation: HashMap<String, usize>,
    failing_extraction: HashSet<String>,
    stalled: HashSet<String>,
    latency: Duration,
    stats: Arc<MockStats>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_navigation(mut self, id: &str) -> Self {
        self.failing_navigation.insert(id.to_string());
        self
    }

    /// Fail the first `times` navigations to `id`, then succeed.
    pub fn fail_navigation_times(mut self, id: &str, times: usize) -> Self {
        self.flaky_navigation.insert(id.to_string(), times);
        self
    }

    pub fn fail_extraction(mut self, id: &str) -> Self {
        self.failing_extraction.insert(id.to_string());
        self
    }

    /// Navigation to `id` never completes.
    pub fn stall(mut self, id: &str) -> Self {
        self.stalled.insert(id.to_string());
        self
    }

    /// Time each call takes.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.stats.navigations.lock().unwrap().clone()
    }

    pub fn navigation_count(&self, id: &str) -> usize {
        self.navigations().iter().filter(|n| *n == id).count()
    }

    pub fn extraction_count(&self, id: &str) -> usize {
        let extractions = self.stats.extractions.lock().unwrap();
        extractions.iter().filter(|n| *n == id).count()
    }

    pub fn forgotten(&self) -> Vec<String> {
        self.stats.forgotten.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.stats.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ItemSource for MockSource {
    async fn navigate_to(&self, id: &str) -> Result<(), BoxError> {
        let attempt = {
            let mut navigations = self.stats.navigations.lock().unwrap();
            navigations.push(id.to_string());
            navigations.iter().filter(|n| *n == id).count()
        };
        self.enter();
        if self.stalled.contains(id) {
            std::future::pending::<()>().await;
        }
        sleep(self.latency).await;
        self.leave();

        if self.failing_navigation.contains(id) {
            return Err(format!("cannot reach {id}").into());
        }
        if let Some(&times) = self.flaky_navigation.get(id) {
            if attempt <= times {
                return Err(format!("rate limited on {id}").into());
            }
        }
        Ok(())
    }

    async fn extract_current(&self, id: &str) -> Result<RawEventFields, BoxError> {
        self.stats.extractions.lock().unwrap().push(id.to_string());
        self.enter();
        sleep(self.latency).await;
        self.leave();

        if self.failing_extraction.contains(id) {
            return Err(format!("no details for {id}").into());
        }
        Ok(RawEventFields {
            title: Some(format!("Event {id}")),
            date: Some("2025-05-06".to_string()),
            link: Some(format!("https://example.test/events/{id}")),
            is_public: Some(true),
            ..Default::default()
        })
    }

    fn forget(&self, id: &str) {
        self.stats.forgotten.lock().unwrap().push(id.to_string());
    }
}

/// Store whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingStore {
    unreadable: bool,
}

impl FailingStore {
    pub fn unreadable() -> Self {
        Self { unreadable: true }
    }
}

impl Persistence for FailingStore {
    async fn load_all(&self) -> Result<Vec<EventRecord>, BoxError> {
        if self.unreadable {
            return Err("store unreadable".into());
        }
        Ok(Vec::new())
    }

    async fn save_all(&self, _records: &[EventRecord]) -> Result<(), BoxError> {
        Err("disk full".into())
    }
}

/// Store whose first `n` writes fail; later writes go to memory.
#[derive(Debug, Default)]
pub struct FlakyStore {
    failures_left: AtomicUsize,
    inner: MemoryStore,
}

impl FlakyStore {
    pub fn failing_first(n: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(n),
            inner: MemoryStore::new(),
        }
    }

    pub fn seeded(mut self, records: Vec<EventRecord>) -> Self {
        self.inner = MemoryStore::with_records(records);
        self
    }
}

impl Persistence for FlakyStore {
    async fn load_all(&self) -> Result<Vec<EventRecord>, BoxError> {
        self.inner.load_all().await
    }

    async fn save_all(&self, records: &[EventRecord]) -> Result<(), BoxError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err("write rejected".into());
        }
        self.inner.save_all(records).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Dispatched {
        category: Category,
        ids: Vec<String>,
        at: Instant,
    },
    Progress {
        category: Category,
        percent: f64,
    },
    BatchComplete {
        category: Category,
        processed: usize,
        success: usize,
    },
    Failure(ItemFailure),
    Stats(ProgressSnapshot),
}

/// Observer that records every callback. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<Observed>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().unwrap().clone()
    }

    pub fn dispatched(&self) -> Vec<Vec<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Dispatched { ids, .. } => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn dispatch_times(&self) -> Vec<Instant> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Dispatched { at, .. } => Some(at),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self, category: Category) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Progress { category: c, percent } if c == category => Some(percent),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<ItemFailure> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Failure(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn stats(&self) -> Vec<ProgressSnapshot> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Observed::Stats(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Observed) {
        self.events.lock().unwrap().push(event);
    }
}

impl RunObserver for RecordingObserver {
    fn on_batch_dispatched(
        &self,
        category: Category,
        _batch_index: usize,
        _batches_in_category: usize,
        ids: &[String],
    ) {
        self.push(Observed::Dispatched {
            category,
            ids: ids.to_vec(),
            at: Instant::now(),
        });
    }

    fn on_progress(&self, category: Category, percent: f64) {
        self.push(Observed::Progress { category, percent });
    }

    fn on_batch_complete(&self, category: Category, processed: usize, success: usize) {
        self.push(Observed::BatchComplete {
            category,
            processed,
            success,
        });
    }

    fn on_failure(&self, failure: &ItemFailure) {
        self.push(Observed::Failure(failure.clone()));
    }

    fn on_stats(&self, snapshot: &ProgressSnapshot) {
        self.push(Observed::Stats(*snapshot));
    }
}
