//! Navigation retry with exponential backoff.
//!
//! [`RetryingSource`] wraps any [`ItemSource`] and retries `navigate_to`
//! when it fails, which absorbs transient rate-limit responses from the
//! remote side. Extraction is passed through untouched. This is the only
//! place an item is ever retried; the scheduler never re-queues identifiers.
//!
//! # Backoff Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=250ms)
//! ```

use super::ItemSource;
use crate::errors::BoxError;
use crate::models::RawEventFields;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

pub struct RetryingSource<S> {
    inner: S,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<S> RetryingSource<S>
where
    S: ItemSource,
{
    /// Wrap `inner`, retrying failed navigations up to `max_retries` times.
    /// With `max_retries == 0` the wrapper is transparent.
    pub fn new(inner: S, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<S> fmt::Debug for RetryingSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingSource")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<S> ItemSource for RetryingSource<S>
where
    S: ItemSource,
{
    #[instrument(level = "debug", skip(self))]
    async fn navigate_to(&self, id: &str) -> Result<(), BoxError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.navigate_to(id).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                id,
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                                error = %e,
                                "navigate_to exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        id,
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "navigate_to failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn extract_current(&self, id: &str) -> Result<RawEventFields, BoxError> {
        self.inner.extract_current(id).await
    }

    fn forget(&self, id: &str) {
        self.inner.forget(id);
    }
}
