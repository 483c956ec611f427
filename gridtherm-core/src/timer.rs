//! Interval timers for the cooperative loop
//!
//! Each periodic activity owns one timer and the scheduler polls it with
//! the current clock reading.

/// A periodic deadline on a millisecond clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntervalTimer {
    period_ms: u64,
    last_ms: u64,
}

impl IntervalTimer {
    /// Timer whose first period starts at `now_ms`
    pub const fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: now_ms,
        }
    }

    pub const fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Whether a full period has passed since the last firing
    pub fn elapsed(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_ms) >= self.period_ms
    }

    /// Fire if elapsed, restarting the period at `now_ms`
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.elapsed(now_ms) {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Restart the period at `now_ms`
    pub fn reset(&mut self, now_ms: u64) {
        self.last_ms = now_ms;
    }

    /// Change the period; the current one keeps its start
    pub fn set_period(&mut self, period_ms: u64) {
        self.period_ms = period_ms;
    }
}
