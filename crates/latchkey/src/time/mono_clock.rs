use crate::TimeSource;
use std::time::Instant;

/// A monotonic time source measuring milliseconds elapsed since construction.
///
/// Backed by [`Instant`], so readings never go backward even if the wall
/// clock is adjusted (NTP, manual changes). Copies share the same origin.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
