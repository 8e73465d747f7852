//! Listing file loading and identifier normalisation.
//!
//! The listing phase (locating event links on the remote page) happens
//! outside this tool; it leaves behind a JSON file shaped like
//! [`EventLinks`]. Entries may be bare identifiers or full event URLs:
//!
//! ```json
//! {
//!   "upcoming": ["https://example.com/events/1234", "5678"],
//!   "past": ["https://example.com/past_events/91011"]
//! }
//! ```

use crate::errors::HarvestError;
use crate::models::{Category, EventLinks};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

static EVENT_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:past_)?events/(\d+)").expect("static regex"));

/// Pull the event identifier out of a listing entry.
///
/// Entries that look like URLs must contain `/events/<digits>` or
/// `/past_events/<digits>`; anything else is taken as an identifier as-is.
pub fn extract_event_id(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    if let Some(caps) = EVENT_URL_RE.captures(entry) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if entry.contains('/') || entry.contains(char::is_whitespace) {
        return None;
    }
    Some(entry.to_string())
}

/// Normalise raw listing entries into a schedulable identifier list.
pub fn normalize(raw: &EventLinks) -> EventLinks {
    let extract = |category: Category| -> Vec<String> {
        raw.get(category)
            .iter()
            .filter_map(|entry| {
                let id = extract_event_id(entry);
                if id.is_none() {
                    warn!(%category, entry = %entry, "Dropping unrecognised listing entry");
                }
                id
            })
            .collect()
    };
    dedupe(EventLinks {
        upcoming: extract(Category::Upcoming),
        past: extract(Category::Past),
    })
}

/// Make every identifier appear exactly once.
///
/// Duplicates within a category keep their first position, and an
/// identifier listed under both categories stays in `upcoming` only.
pub fn dedupe(links: EventLinks) -> EventLinks {
    let upcoming: Vec<String> = links.upcoming.into_iter().unique().collect();
    let scheduled: HashSet<&str> = upcoming.iter().map(String::as_str).collect();
    let past: Vec<String> = links
        .past
        .into_iter()
        .unique()
        .filter(|id| {
            let fresh = !scheduled.contains(id.as_str());
            if !fresh {
                debug!(id = %id, "Listed as both upcoming and past; keeping upcoming");
            }
            fresh
        })
        .collect();
    EventLinks { upcoming, past }
}

/// Read and normalise a listing file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_links(path: &Path) -> Result<EventLinks, HarvestError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| HarvestError::Listing(format!("cannot read {}: {e}", path.display())))?;
    let raw: EventLinks = serde_json::from_str(&text)
        .map_err(|e| HarvestError::Listing(format!("cannot parse {}: {e}", path.display())))?;

    let links = normalize(&raw);
    info!(
        upcoming = links.upcoming.len(),
        past = links.past.len(),
        dropped = raw.total() - links.total(),
        "Loaded event links"
    );
    Ok(links)
}
