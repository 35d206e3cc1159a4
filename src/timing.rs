//! Elapsed-time accounting.
//!
//! A tick is one nanosecond of [`std::time::Instant`], the platform's
//! monotonic clock.

use std::time::Duration;

/// Converts a duration to ticks, saturating at `u64::MAX`.
pub fn ticks(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
}

/// Running sum of elapsed ticks over a number of iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickAccumulator {
    total: u64,
    iterations: u32,
}

impl TickAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.record_ticks(ticks(elapsed));
    }

    pub fn record_ticks(&mut self, ticks: u64) {
        self.total = self.total.saturating_add(ticks);
        self.iterations += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// `total / iterations`, or `0.0` before the first iteration.
    pub fn average(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.total as f64 / f64::from(self.iterations)
    }
}
