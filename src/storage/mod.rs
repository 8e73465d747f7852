//! Record persistence backends.
//!
//! The orchestrator persists through the [`Persistence`] trait, which only
//! offers whole-collection reads and writes: there is no partial-key update.
//! Merging by identifier happens above this layer, in
//! [`DedupStore`](crate::orchestrator::DedupStore).
//!
//! # Backends
//!
//! - [`json_file`]: a JSON document on disk (the normal backend)
//! - [`MemoryStore`]: process-local, used by `run --dry-run`

use crate::errors::BoxError;
use crate::models::EventRecord;
use std::sync::Mutex;

pub mod json_file;

pub use json_file::JsonFileStore;

/// Whole-collection record storage.
pub trait Persistence {
    async fn load_all(&self) -> Result<Vec<EventRecord>, BoxError>;
    async fn save_all(&self, records: &[EventRecord]) -> Result<(), BoxError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<EventRecord>>,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<EventRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl Persistence for MemoryStore {
    async fn load_all(&self) -> Result<Vec<EventRecord>, BoxError> {
        let records = self.records.lock().map_err(|_| "memory store poisoned")?;
        Ok(records.clone())
    }

    async fn save_all(&self, records: &[EventRecord]) -> Result<(), BoxError> {
        let mut stored = self.records.lock().map_err(|_| "memory store poisoned")?;
        *stored = records.to_vec();
        Ok(())
    }
}
