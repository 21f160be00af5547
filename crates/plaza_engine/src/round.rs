//! Round timing
//!
//! The coordinator ticks at a short fixed interval. Each tick asks the clock
//! whether the round ran out; only then does the narrative resolve.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RoundClock {
    duration: Duration,
    started: Instant,
}

impl RoundClock {
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            started: now,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    /// Remaining time, never negative.
    pub fn time_left(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.duration
    }

    pub fn restart(&mut self, now: Instant) {
        self.started = now;
    }
}
