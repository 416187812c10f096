//! Monotonic time sources.
//!
//! Game time is a [`Duration`] offset from the moment a clock was created.
//! Nothing in the game reads wall-clock time directly: the tracker and the
//! role handler take `now` as an argument, and the runner asks a [`Clock`].
//! [`TokioClock`] follows tokio's clock, so paused-time tests stay
//! deterministic; [`ManualClock`] is advanced by hand.

use core::time::Duration;
use std::sync::atomic::{AtomicU64, Ordering};

/// A source of monotonic game time.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Clock backed by [`tokio::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Start a clock at the current tokio instant.
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to, with millisecond resolution.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading zero.
    pub const fn new() -> Self {
        Self {
            millis: AtomicU64::new(0),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let step = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |ms| {
                Some(ms.saturating_add(step))
            });
    }

    /// Jump to an absolute reading. Moving backwards is ignored.
    pub fn set(&self, at: Duration) {
        let target = u64::try_from(at.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_max(target, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(Duration::from_millis(100));
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(350));
    }

    #[test]
    fn manual_clock_never_runs_backwards() {
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(4));
        clock.set(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(clock.now(), Duration::from_millis(1500));
    }
}
