//! Checker configuration.

use std::time::Duration;

use crate::diagnostics::FatalMode;

/// Byte written across released pages.
pub const PAGE_POISON: u8 = 0xaa;

/// Default incident log capacity.
pub const DEFAULT_LOG_CAPACITY: usize = 8;

/// Default reports allowed per rate-limit window.
pub const DEFAULT_RATELIMIT_BURST: u32 = 10;

/// Default rate-limit window.
pub const DEFAULT_RATELIMIT_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the poison checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoisonConfig {
    /// Poison byte (default: 0xaa)
    pub pattern: u8,

    /// Incident log capacity; at most `capacity - 1` records are kept before
    /// the next single-bit error is fatal (default: 8)
    pub log_capacity: usize,

    /// Reports allowed per window (default: 10)
    pub ratelimit_burst: u32,

    /// Rate-limit window; zero disables limiting (default: 5 s)
    pub ratelimit_interval: Duration,

    /// Ask the mapper to make poisoned pages read-only
    pub protect_pages: bool,

    /// Let a denied rate-limit check drop general corruption too
    pub suppress_limited_corruption: bool,

    /// What a fatal stop does
    pub fatal_mode: FatalMode,
}

impl Default for PoisonConfig {
    fn default() -> Self {
        Self {
            pattern: PAGE_POISON,
            log_capacity: DEFAULT_LOG_CAPACITY,
            ratelimit_burst: DEFAULT_RATELIMIT_BURST,
            ratelimit_interval: DEFAULT_RATELIMIT_INTERVAL,
            protect_pages: true,
            suppress_limited_corruption: false,
            fatal_mode: FatalMode::Abort,
        }
    }
}

impl PoisonConfig {
    /// Escalate on the second single-bit error and report only once per window.
    pub fn strict() -> Self {
        Self {
            log_capacity: 2,
            ratelimit_burst: 1,
            fatal_mode: FatalMode::Panic,
            ..Self::default()
        }
    }

    /// Panicking fatal mode without page protection, for test harnesses.
    pub fn testing() -> Self {
        Self {
            protect_pages: false,
            fatal_mode: FatalMode::Panic,
            ..Self::default()
        }
    }

    /// Default configuration with overrides from the environment.
    ///
    /// Reads `PAGEPOISON_FATAL` (`abort` or `panic`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(mode) = FatalMode::from_env() {
            config.fatal_mode = mode;
        }
        config
    }

    /// Builder pattern: set the poison byte.
    pub fn with_pattern(mut self, pattern: u8) -> Self {
        self.pattern = pattern;
        self
    }

    /// Builder pattern: set the incident log capacity (clamped to at least 1).
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity.max(1);
        self
    }

    /// Builder pattern: set the rate limit.
    pub fn with_ratelimit(mut self, interval: Duration, burst: u32) -> Self {
        self.ratelimit_interval = interval;
        self.ratelimit_burst = burst;
        self
    }

    /// Builder pattern: disable rate limiting.
    pub fn without_ratelimit(self) -> Self {
        self.with_ratelimit(Duration::ZERO, 0)
    }

    /// Builder pattern: enable page protection.
    pub fn with_protection(mut self, enable: bool) -> Self {
        self.protect_pages = enable;
        self
    }

    /// Builder pattern: let rate limiting suppress general corruption.
    pub fn with_limited_corruption_suppressed(mut self, suppress: bool) -> Self {
        self.suppress_limited_corruption = suppress;
        self
    }

    /// Builder pattern: set the fatal mode.
    pub fn with_fatal_mode(mut self, mode: FatalMode) -> Self {
        self.fatal_mode = mode;
        self
    }
}
