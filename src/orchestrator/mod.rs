//! Batch extraction orchestration.
//!
//! [`BatchScheduler`](scheduler::BatchScheduler) owns a run: it splits
//! identifiers into batches, drives each batch through an
//! [`EventCollector`](collector::EventCollector) under a
//! [`ConcurrencyLimiter`](limiter::ConcurrencyLimiter), and waits on the
//! [`PauseController`](pause::PauseController) and a
//! [`RateDelay`](delay::RateDelay) between batches. Results land in a
//! [`DedupStore`](dedup::DedupStore).

pub mod collector;
pub mod dedup;
pub mod delay;
pub mod limiter;
pub mod pause;
pub mod progress;
pub mod scheduler;
