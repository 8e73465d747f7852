//! Identifier-keyed view over a whole-collection store.
//!
//! [`DedupStore`] loads the persisted collection once, keeps it in memory,
//! and on every `put` replaces-or-appends by `id` and writes the whole
//! collection back. The lock is held across the write, so two collection
//! workflows finishing in the same tick cannot lose each other's update.
//! The in-memory view only changes once the write has succeeded: a record
//! the store rejected is not reported by `has` or `get`, and is not carried
//! to disk by a later `put`.

use crate::errors::HarvestError;
use crate::models::EventRecord;
use crate::storage::Persistence;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    Replaced,
}

#[derive(Debug, Default)]
struct Entries {
    records: Vec<EventRecord>,
    index: HashMap<String, usize>,
}

impl Entries {
    fn from_records(records: Vec<EventRecord>) -> Self {
        let mut entries = Entries::default();
        for record in records {
            entries.upsert(record);
        }
        entries
    }

    /// The collection as it would look after `upsert(record)`.
    fn staged(&self, record: &EventRecord) -> Vec<EventRecord> {
        let mut records = self.records.clone();
        match self.index.get(&record.id) {
            Some(&pos) => records[pos] = record.clone(),
            None => records.push(record.clone()),
        }
        records
    }

    fn upsert(&mut self, record: EventRecord) -> PutOutcome {
        match self.index.get(&record.id) {
            Some(&pos) => {
                self.records[pos] = record;
                PutOutcome::Replaced
            }
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                PutOutcome::Inserted
            }
        }
    }
}

#[derive(Debug)]
pub struct DedupStore<P> {
    persistence: P,
    entries: Mutex<Entries>,
}

impl<P> DedupStore<P>
where
    P: Persistence,
{
    /// Load the existing collection. Duplicate ids already on disk collapse
    /// to the last occurrence.
    #[instrument(level = "info", skip_all)]
    pub async fn load(persistence: P) -> Result<Self, HarvestError> {
        let records = persistence
            .load_all()
            .await
            .map_err(HarvestError::persistence)?;
        let loaded = records.len();
        let entries = Entries::from_records(records);
        if entries.records.len() != loaded {
            warn!(
                loaded,
                unique = entries.records.len(),
                "Stored collection contained duplicate ids"
            );
        }
        debug!(count = entries.records.len(), "Dedup store ready");
        Ok(Self {
            persistence,
            entries: Mutex::new(entries),
        })
    }

    pub async fn has(&self, id: &str) -> bool {
        self.entries.lock().await.index.contains_key(id)
    }

    pub async fn get(&self, id: &str) -> Option<EventRecord> {
        let entries = self.entries.lock().await;
        entries.index.get(id).map(|&pos| entries.records[pos].clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.records.len()
    }

    /// Append or replace by `id` as one step: write the whole collection
    /// with the record applied, and commit it to memory only if the write
    /// succeeds. A failed write leaves the store exactly as it was.
    pub async fn put(&self, record: EventRecord) -> Result<PutOutcome, HarvestError> {
        let mut entries = self.entries.lock().await;
        let staged = entries.staged(&record);
        self.persistence
            .save_all(&staged)
            .await
            .map_err(|e| HarvestError::Persistence(format!("saving {}: {e}", record.id)))?;

        let id = record.id.clone();
        let outcome = entries.upsert(record);
        debug!(%id, ?outcome, total = entries.records.len(), "Record persisted");
        Ok(outcome)
    }

    #[cfg(test)]
    pub fn persistence(&self) -> &P {
        &self.persistence
    }
}
