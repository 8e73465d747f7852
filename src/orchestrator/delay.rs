//! Randomised inter-batch pacing.

use rand::{Rng, rng};
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Waits a uniformly random duration in `[min_ms, max_ms]` (inclusive).
///
/// Applied once per batch boundary, never per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDelay {
    min_ms: u64,
    max_ms: u64,
}

impl RateDelay {
    /// Callers pass a validated range; an inverted range is clamped to `min_ms`.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms,
            max_ms: max_ms.max(min_ms),
        }
    }

    pub fn next_delay(&self) -> Duration {
        let ms = rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Sleep for one freshly drawn delay and return how long it was.
    pub async fn wait(&self) -> Duration {
        let delay = self.next_delay();
        info!(delay_ms = delay.as_millis() as u64, "Applying rate delay");
        sleep(delay).await;
        delay
    }
}
