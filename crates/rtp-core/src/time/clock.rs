use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic time source used to stamp packet arrivals.
///
/// Wall-clock time is never used for media timing; a system clock step would
/// otherwise corrupt playout delays and jitter estimates.
pub trait MediaClock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl MediaClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used by tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a manual clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// Move the clock forward by a number of milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaClock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}
