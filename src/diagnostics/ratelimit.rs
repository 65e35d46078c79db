//! Token-bucket rate limiting for corruption reports.
//!
//! A window opens on the first report. Up to `burst` reports pass per
//! window; the rest are counted as missed. The first report after the
//! window expires opens a new one and hands back the missed count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic time.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |now| Some(now.saturating_add(by)));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

/// Result of asking the limiter for permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether this report may proceed.
    pub allowed: bool,
    /// Reports dropped in the window that just closed (non-zero only on the
    /// first check of a new window).
    pub missed_in_previous_window: u32,
}

/// Burst-per-interval limiter state.
///
/// Not synchronized; the owner serializes access.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    burst: u32,
    begin: Option<Duration>,
    printed: u32,
    missed: u32,
}

impl RateLimiter {
    /// Allow `burst` reports per `interval`.
    ///
    /// A zero interval disables limiting; a zero burst suppresses everything.
    pub fn new(interval: Duration, burst: u32) -> Self {
        Self {
            interval,
            burst,
            begin: None,
            printed: 0,
            missed: 0,
        }
    }

    /// Ask whether a report at time `now` may proceed.
    pub fn check(&mut self, now: Duration) -> RateDecision {
        if self.interval.is_zero() {
            return RateDecision { allowed: true, missed_in_previous_window: 0 };
        }

        let begin = *self.begin.get_or_insert(now);
        let mut missed_in_previous_window = 0;

        // A window whose end overflows never expires.
        let expired = begin.checked_add(self.interval).map_or(false, |end| now > end);
        if expired {
            missed_in_previous_window = self.missed;
            self.begin = Some(now);
            self.printed = 0;
            self.missed = 0;
        }

        let allowed = self.burst > self.printed;
        if allowed {
            self.printed += 1;
        } else {
            self.missed = self.missed.saturating_add(1);
        }

        RateDecision { allowed, missed_in_previous_window }
    }

    /// Reports dropped so far in the current window.
    pub fn missed(&self) -> u32 {
        self.missed
    }
}
