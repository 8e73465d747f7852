//! Error types for the harvest pipeline.
//!
//! Two families live here:
//!
//! - [`HarvestError`]: run-level failures (bad configuration, unreadable
//!   listing, broken store). These stop a run before it starts, or are
//!   reported to the caller of a CLI command.
//! - [`FailureKind`]: the classification attached to a single identifier
//!   that could not be collected. Item failures are values carried in
//!   [`ItemFailure`](crate::models::ItemFailure), never errors that unwind
//!   the scheduler.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error type returned by collaborators (item sources, persistence backends).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid listing: {0}")]
    Listing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl HarvestError {
    pub fn persistence(e: impl fmt::Display) -> Self {
        HarvestError::Persistence(e.to_string())
    }
}

/// Why a single identifier failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    /// The source could not bring the item into view.
    Navigation,
    /// The item was reached but its fields could not be read.
    Extraction,
    /// The record was extracted but the store rejected the write.
    Persistence,
    /// Navigation, settle and extraction did not finish within the item timeout.
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Navigation => "NavigationFailure",
            FailureKind::Extraction => "ExtractionFailure",
            FailureKind::Persistence => "PersistenceFailure",
            FailureKind::Timeout => "TimeoutFailure",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Navigation.to_string(), "NavigationFailure");
        assert_eq!(FailureKind::Extraction.to_string(), "ExtractionFailure");
        assert_eq!(FailureKind::Persistence.to_string(), "PersistenceFailure");
        assert_eq!(FailureKind::Timeout.to_string(), "TimeoutFailure");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: HarvestError = io.into();
        assert!(matches!(err, HarvestError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_persistence_helper() {
        let err = HarvestError::persistence("disk full");
        assert_eq!(err.to_string(), "Persistence error: disk full");
    }
}
