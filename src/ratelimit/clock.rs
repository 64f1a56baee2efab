//! Time sources for token refill.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A source of monotonic time readings.
///
/// Buckets never read the system clock directly; the limiter hands them the
/// reading from its clock so refill behavior can be driven from tests.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Intended for tests, including those of crates embedding the limiter:
/// share it through an `Arc` with [`RateLimiter::with_clock`] and call
/// [`advance`](Self::advance) to simulate elapsed time without sleeping.
///
/// [`RateLimiter::with_clock`]: super::RateLimiter::with_clock
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance_millis(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
