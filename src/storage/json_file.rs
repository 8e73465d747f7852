//! JSON file persistence, export and clearing.
//!
//! # File Layout
//!
//! ```json
//! {
//!   "events": [ { "id": "123", "title": "...", "fetchedAt": "...", "category": "upcoming" } ],
//!   "lastUpdate": "2025-05-06T20:30:00+00:00"
//! }
//! ```
//!
//! Saves go through a sibling temp file and a rename so a crash mid-write
//! never leaves a truncated store behind.

use super::Persistence;
use crate::errors::{BoxError, HarvestError};
use crate::models::EventRecord;
use crate::utils::{ensure_writable_dir, export_timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageData {
    #[serde(default)]
    events: Vec<EventRecord>,
    #[serde(default)]
    last_update: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the store file. A missing file is not an error.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn clear(&self) -> Result<(), HarvestError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Store cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Store already empty");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write every stored record to `<out_dir>/events-<timestamp>.json`.
    ///
    /// Returns `Ok(None)` when the store holds nothing to export.
    #[instrument(level = "info", skip_all, fields(out_dir = %out_dir.display()))]
    pub async fn export_to(&self, out_dir: &Path) -> Result<Option<PathBuf>, HarvestError> {
        let records = self.load_all().await.map_err(HarvestError::persistence)?;
        if records.is_empty() {
            info!("No events to export");
            return Ok(None);
        }

        ensure_writable_dir(out_dir).await?;
        let target = out_dir.join(format!("events-{}.json", export_timestamp(Utc::now())));
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(&target, json).await?;
        info!(path = %target.display(), count = records.len(), "Exported events");
        Ok(Some(target))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Persistence for JsonFileStore {
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    async fn load_all(&self) -> Result<Vec<EventRecord>, BoxError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file missing; starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let data: StorageData = serde_json::from_str(&text)?;
        debug!(count = data.events.len(), "Loaded stored events");
        Ok(data.events)
    }

    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = records.len()))]
    async fn save_all(&self, records: &[EventRecord]) -> Result<(), BoxError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let data = StorageData {
            events: records.to_vec(),
            last_update: Some(Utc::now().to_rfc3339()),
        };
        let json = serde_json::to_string_pretty(&data)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
