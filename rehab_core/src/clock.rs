//! Monotonic time sources.
//!
//! Target lifetimes and hold dwell are measured in real elapsed time, never
//! in tick counts, so a slow frame does not stretch a 5 s timeout.  The game
//! reads time only through [`Clock`], which lets tests step time by hand.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// A monotonic time source.  `now()` is the time elapsed since the clock's
/// own origin and never decreases.
pub trait Clock {
    fn now(&self) -> Duration;
}

// ════════════════════════════════════════════════════════════════════════════
// SystemClock
// ════════════════════════════════════════════════════════════════════════════

/// Wall-clock time backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self { Self::new() }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration { self.origin.elapsed() }
}

// ════════════════════════════════════════════════════════════════════════════
// ManualClock
// ════════════════════════════════════════════════════════════════════════════

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self { Self::default() }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to an absolute time.  Moving backwards is ignored.
    pub fn set(&self, at: Duration) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration { self.now.get() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let c = ManualClock::new();
        assert_eq!(c.now(), Duration::ZERO);
        c.advance_ms(250);
        c.advance_ms(250);
        assert_eq!(c.now(), Duration::from_millis(500));
    }

    #[test]
    fn manual_clock_never_goes_back() {
        let c = ManualClock::new();
        c.set(Duration::from_secs(3));
        c.set(Duration::from_secs(1));
        assert_eq!(c.now(), Duration::from_secs(3));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let c = SystemClock::new();
        let a = c.now();
        let b = c.now();
        assert!(b >= a);
    }
}
