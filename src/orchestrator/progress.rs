//! Progress aggregation.

use serde::Serialize;

/// Rounded `success / total` percentage, 0 when `total == 0`.
pub fn success_rate(total: usize, success: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((success as f64 / total as f64) * 100.0).round() as u32
}

/// Share of a category's batches that have completed, as a percentage.
///
/// Counted in batches, not items: 5 items with a batch size of 2 report
/// 33, 67, 100 rather than 40, 80, 100. Only the last batch may be short,
/// so the two agree whenever the category divides evenly.
pub fn category_percent(completed_batches: usize, total_batches: usize) -> f64 {
    if total_batches == 0 {
        return 100.0;
    }
    (completed_batches as f64 / total_batches as f64) * 100.0
}

/// Last values reported to the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    /// Rounded success percentage over `total`.
    pub success_rate: u32,
    /// `processed / total` in `[0, 1]`.
    pub fraction: f64,
}

/// Pure aggregator: each update replaces the previous snapshot.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: ProgressSnapshot,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, total: usize, processed: usize, success: usize) -> ProgressSnapshot {
        let fraction = if total == 0 {
            0.0
        } else {
            processed as f64 / total as f64
        };
        self.last = ProgressSnapshot {
            total,
            processed,
            success,
            success_rate: success_rate(total, success),
            fraction,
        };
        self.last
    }

}
