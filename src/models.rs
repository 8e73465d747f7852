//! Data models shared by the listing loader, the orchestrator and the stores.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Category`]: partition of the listing (`upcoming` before `past`)
//! - [`EventLinks`]: the identifier lists produced by the listing phase
//! - [`RawEventFields`]: what an item source hands back for one item
//! - [`EventRecord`]: the persisted unit
//! - [`ItemFailure`] and [`RunReport`]: outcomes of a run
//!
//! Records serialize with camelCase keys (`isPublic`, `fetchedAt`) so stored
//! files stay compatible with the listing tooling that consumes them.

use crate::errors::FailureKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Partition of the identifier list. Categories are processed in
/// [`Category::ORDER`] and never interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Upcoming,
    Past,
}

impl Category {
    pub const ORDER: [Category; 2] = [Category::Upcoming, Category::Past];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Upcoming => "upcoming",
            Category::Past => "past",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier lists per category, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLinks {
    #[serde(default)]
    pub upcoming: Vec<String>,
    #[serde(default)]
    pub past: Vec<String>,
}

impl EventLinks {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Upcoming => &self.upcoming,
            Category::Past => &self.past,
        }
    }

    pub fn total(&self) -> usize {
        self.upcoming.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Fields read from the current item by an item source.
///
/// Every field is optional: sources report what they could find and the
/// collector never invents values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventFields {
    pub title: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub is_public: Option<bool>,
}

/// A persisted event.
///
/// `id` is the identifier the record was collected for and is never
/// rewritten. The descriptive fields are filled once, when extraction
/// succeeds; `fetched_at` is stamped when the record is handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    pub fetched_at: String,
    pub category: Category,
}

impl EventRecord {
    /// Assemble a record from extracted fields.
    pub fn from_raw(
        id: impl Into<String>,
        category: Category,
        raw: RawEventFields,
        fetched_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: raw.title,
            date: raw.date,
            location: raw.location,
            description: raw.description,
            image: raw.image,
            link: raw.link,
            is_public: raw.is_public,
            fetched_at: fetched_at.into(),
            category,
        }
    }
}

/// One identifier that could not be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub category: Category,
    pub kind: FailureKind,
    pub reason: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}: {}", self.id, self.category, self.kind, self.reason)
    }
}

/// Summary of one completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Identifiers scheduled after listing deduplication.
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    /// Identifiers counted as successes without a remote call (`onExisting: skip`).
    pub skipped: usize,
    /// Navigation requests issued to the item source.
    pub requests: usize,
    pub batches: usize,
    pub failures: Vec<ItemFailure>,
    pub records: Vec<EventRecord>,
}

impl RunReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Rounded success percentage over the scheduled total, 0 when nothing was scheduled.
    pub fn success_rate(&self) -> u32 {
        crate::orchestrator::progress::success_rate(self.total, self.success)
    }
}
