//! Monotonic time

/// Free-running monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since boot
    fn now_ms(&self) -> u64;
}
