//! Remote item sources.
//!
//! An item source is the collaborator that can bring one remote item into
//! view and read its fields. The orchestrator only ever talks to the
//! [`ItemSource`] trait; concrete sources decide what "navigate" means.
//!
//! # Implementations
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | JSON over HTTP | [`http`] | `GET <base>/events/<id>`, body decoded into [`RawEventFields`] |
//! | Backoff decorator | [`retry`] | Retries navigation with exponential backoff and jitter |

use crate::errors::BoxError;
use crate::models::RawEventFields;

pub mod http;
pub mod retry;

pub use http::HttpItemSource;
pub use retry::RetryingSource;

/// Capability to reach and read a single remote item.
///
/// Several collection workflows may share one source and interleave, so
/// `extract_current` is told which identifier it is reading for.
pub trait ItemSource {
    /// Bring the item named by `id` into view.
    async fn navigate_to(&self, id: &str) -> Result<(), BoxError>;

    /// Read the fields of the item previously navigated to for `id`.
    async fn extract_current(&self, id: &str) -> Result<RawEventFields, BoxError>;

    /// Drop anything held for `id` after a collection that did not reach
    /// extraction (timeout, navigation error).
    fn forget(&self, _id: &str) {}
}
