//! Polling timer and the clock seam used by the timed preview phases.

use std::time::{Duration, Instant};

/// Source of time for the session loops.
///
/// The countdown and wait phases only ever ask "what time is it" and "pause
/// briefly", so swapping in a fake clock makes them testable without real
/// sleeps.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by `Instant` and `thread::sleep`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Tracks a fixed duration from a start instant.
///
/// Not a clock itself: callers feed it the current instant and poll
/// `is_timeout` / `remaining`. Created at the start of each timed phase and
/// discarded when the phase ends.
#[derive(Debug, Clone, Copy)]
pub struct PoolingTimer {
    started: Instant,
    duration: Duration,
}

impl PoolingTimer {
    pub fn start(duration: Duration, now: Instant) -> Self {
        Self {
            started: now,
            duration,
        }
    }

    /// Time left before the duration elapses (zero once expired).
    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration
            .saturating_sub(now.saturating_duration_since(self.started))
    }

    pub fn is_timeout(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_not_expired_at_start() {
        let now = Instant::now();
        let timer = PoolingTimer::start(Duration::from_secs(3), now);
        assert!(!timer.is_timeout(now));
        assert_eq!(timer.remaining(now), Duration::from_secs(3));
    }

    #[test]
    fn test_timer_expires_after_duration() {
        let now = Instant::now();
        let timer = PoolingTimer::start(Duration::from_secs(3), now);
        let later = now + Duration::from_secs(3);
        assert!(timer.is_timeout(later));
        assert_eq!(timer.remaining(later), Duration::ZERO);
    }

    #[test]
    fn test_timer_remaining_counts_down() {
        let now = Instant::now();
        let timer = PoolingTimer::start(Duration::from_secs(3), now);
        let mid = now + Duration::from_millis(1200);
        assert!(!timer.is_timeout(mid));
        assert_eq!(timer.remaining(mid), Duration::from_millis(1800));
    }

    #[test]
    fn test_timer_remaining_saturates_past_deadline() {
        let now = Instant::now();
        let timer = PoolingTimer::start(Duration::from_secs(1), now);
        let way_past = now + Duration::from_secs(10);
        assert_eq!(timer.remaining(way_past), Duration::ZERO);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.now() >= a);
    }
}
