//! Per-identifier collection workflow.
//!
//! For one identifier: navigate, let the remote page settle, extract,
//! assemble an [`EventRecord`] and hand it to the [`DedupStore`]. Every
//! failure is caught here and turned into an [`ItemOutcome`]; nothing
//! escapes to sibling workflows or to the batch.

use super::dedup::DedupStore;
use crate::config::ExistingPolicy;
use crate::errors::FailureKind;
use crate::models::{Category, EventRecord, ItemFailure, RawEventFields};
use crate::source::ItemSource;
use crate::storage::Persistence;
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Extracted and durably stored.
    Stored(EventRecord),
    /// Already in the store and left alone (`onExisting: skip`).
    Skipped { id: String },
    /// Not stored. `record` is set when extraction worked but the write did not.
    Failed {
        failure: ItemFailure,
        record: Option<EventRecord>,
    },
}

impl ItemOutcome {
    /// Whether a navigation request was issued for this item.
    pub fn made_request(&self) -> bool {
        !matches!(self, ItemOutcome::Skipped { .. })
    }
}

#[derive(Debug)]
pub struct EventCollector<S, P> {
    source: S,
    store: DedupStore<P>,
    settle: Duration,
    item_timeout: Option<Duration>,
    on_existing: ExistingPolicy,
}

impl<S, P> EventCollector<S, P>
where
    S: ItemSource,
    P: Persistence,
{
    pub fn new(
        source: S,
        store: DedupStore<P>,
        settle: Duration,
        item_timeout: Option<Duration>,
        on_existing: ExistingPolicy,
    ) -> Self {
        Self {
            source,
            store,
            settle,
            item_timeout,
            on_existing,
        }
    }

    pub fn store(&self) -> &DedupStore<P> {
        &self.store
    }

    #[instrument(level = "info", skip_all, fields(id = %id, category = %category))]
    pub async fn collect(&self, id: &str, category: Category) -> ItemOutcome {
        match self.on_existing {
            ExistingPolicy::Skip => {
                if let Some(existing) = self.store.get(id).await {
                    debug!(id, fetched_at = %existing.fetched_at, "Already stored; skipping");
                    return ItemOutcome::Skipped { id: id.to_string() };
                }
            }
            ExistingPolicy::Replace => {
                if self.store.has(id).await {
                    debug!(id, "Already stored; collecting again to replace");
                }
            }
        }

        let t0 = Instant::now();
        let fetched = match self.item_timeout {
            Some(limit) => match timeout(limit, self.fetch(id)).await {
                Ok(result) => result,
                Err(_) => Err((
                    FailureKind::Timeout,
                    format!("no result within {} ms", limit.as_millis()),
                )),
            },
            None => self.fetch(id).await,
        };

        let raw = match fetched {
            Ok(raw) => raw,
            Err((kind, reason)) => {
                if kind != FailureKind::Extraction {
                    self.source.forget(id);
                }
                warn!(id, %kind, %reason, "Collection failed");
                return ItemOutcome::Failed {
                    failure: ItemFailure {
                        id: id.to_string(),
                        category,
                        kind,
                        reason,
                    },
                    record: None,
                };
            }
        };

        let record = EventRecord::from_raw(id, category, raw, Utc::now().to_rfc3339());
        match self.store.put(record.clone()).await {
            Ok(outcome) => {
                info!(
                    id,
                    ?outcome,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Event collected"
                );
                ItemOutcome::Stored(record)
            }
            Err(e) => {
                warn!(id, error = %e, "Event extracted but not persisted");
                ItemOutcome::Failed {
                    failure: ItemFailure {
                        id: id.to_string(),
                        category,
                        kind: FailureKind::Persistence,
                        reason: e.to_string(),
                    },
                    record: Some(record),
                }
            }
        }
    }

    async fn fetch(&self, id: &str) -> Result<RawEventFields, (FailureKind, String)> {
        self.source
            .navigate_to(id)
            .await
            .map_err(|e| (FailureKind::Navigation, e.to_string()))?;
        sleep(self.settle).await;
        self.source
            .extract_current(id)
            .await
            .map_err(|e| (FailureKind::Extraction, e.to_string()))
    }
}
