//! Clock Source
//!
//! Supplies the current time for expiry comparisons. The trait seam lets
//! tests and the demo fast-forward time without sleeping.

use crate::core_types::TimestampMs;

#[cfg(any(test, feature = "mock-vault"))]
use super::types::MS_PER_DAY;

/// Clock source - monotonic non-decreasing
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_ms(&self) -> TimestampMs;
}

/// Wall-clock time via chrono
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock for expiry tests and the demo
///
/// Only moves forward; there is no way to rewind, keeping the
/// non-decreasing contract.
#[cfg(any(test, feature = "mock-vault"))]
#[derive(Debug)]
pub struct SimulatedClock {
    now: std::sync::atomic::AtomicI64,
}

#[cfg(any(test, feature = "mock-vault"))]
impl SimulatedClock {
    /// Create a clock frozen at `start` millis
    pub fn new(start: TimestampMs) -> Self {
        Self {
            now: std::sync::atomic::AtomicI64::new(start),
        }
    }

    /// Create a clock starting at the current wall-clock time
    pub fn from_wall_clock() -> Self {
        Self::new(chrono::Utc::now().timestamp_millis())
    }

    /// Advance by `delta` milliseconds
    pub fn advance_ms(&self, delta: i64) {
        assert!(delta >= 0, "SimulatedClock never rewinds");
        self.now
            .fetch_add(delta, std::sync::atomic::Ordering::SeqCst);
    }

    /// Advance by whole days
    pub fn advance_days(&self, days: u32) {
        self.advance_ms(days as i64 * MS_PER_DAY);
    }
}

#[cfg(any(test, feature = "mock-vault"))]
impl Clock for SimulatedClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}
