//! Injectable checker state.
//!
//! A `PoisonContext` replaces process-wide globals: whoever wires the
//! allocator to the checker owns one and hands it out by `Arc`.

use std::sync::Arc;

use super::recorder::{CorruptionRecord, DiagnosticRecorder, IncidentLog};
use crate::api::config::PoisonConfig;
use crate::api::stats::{CheckerCounters, CheckerStats};
use crate::diagnostics::emit::{DiagnosticSink, StderrSink};
use crate::diagnostics::fatal::FatalHandler;
use crate::diagnostics::ratelimit::{Clock, MonotonicClock, RateLimiter};

/// Configuration, incident log, rate limiter and counters for one checker.
pub struct PoisonContext {
    config: PoisonConfig,
    recorder: DiagnosticRecorder,
    counters: CheckerCounters,
}

impl PoisonContext {
    /// Create a context reporting to stderr with the configured fatal mode.
    pub fn new(config: PoisonConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start building a context with custom collaborators.
    pub fn builder(config: PoisonConfig) -> PoisonContextBuilder {
        PoisonContextBuilder::new(config)
    }

    /// Active configuration.
    pub fn config(&self) -> &PoisonConfig {
        &self.config
    }

    /// Recorded single-bit errors, oldest first.
    pub fn incidents(&self) -> Vec<CorruptionRecord> {
        self.recorder.incidents()
    }

    /// Number of recorded single-bit errors.
    pub fn incident_count(&self) -> usize {
        self.recorder.incident_count()
    }

    /// Incident log capacity.
    pub fn log_capacity(&self) -> usize {
        self.recorder.capacity()
    }

    /// Snapshot of activity counters.
    pub fn stats(&self) -> CheckerStats {
        self.counters.snapshot()
    }

    pub(crate) fn recorder(&self) -> &DiagnosticRecorder {
        &self.recorder
    }

    pub(crate) fn counters(&self) -> &CheckerCounters {
        &self.counters
    }
}

impl std::fmt::Debug for PoisonContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoisonContext")
            .field("config", &self.config)
            .field("incidents", &self.incident_count())
            .field("counters", &self.counters)
            .finish()
    }
}

/// Builder for [`PoisonContext`].
pub struct PoisonContextBuilder {
    config: PoisonConfig,
    sink: Option<Arc<dyn DiagnosticSink>>,
    fatal: Option<Arc<dyn FatalHandler>>,
    clock: Option<Arc<dyn Clock>>,
}

impl PoisonContextBuilder {
    /// Create a new builder.
    pub fn new(config: PoisonConfig) -> Self {
        Self {
            config,
            sink: None,
            fatal: None,
            clock: None,
        }
    }

    /// Send diagnostics to `sink` instead of stderr.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Stop through `handler` instead of the configured fatal mode.
    pub fn with_fatal_handler(mut self, handler: Arc<dyn FatalHandler>) -> Self {
        self.fatal = Some(handler);
        self
    }

    /// Read rate-limit time from `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the context.
    pub fn build(self) -> PoisonContext {
        let config = self.config;
        let sink = self.sink.unwrap_or_else(|| Arc::new(StderrSink::new()));
        let fatal = self.fatal.unwrap_or_else(|| config.fatal_mode.handler());
        let clock = self.clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        let recorder = DiagnosticRecorder::new(
            RateLimiter::new(config.ratelimit_interval, config.ratelimit_burst),
            IncidentLog::new(config.log_capacity),
            sink,
            fatal,
            clock,
        );

        log::debug!(
            "poison context: pattern {:#04x}, log capacity {}, {} reports per {:?}",
            config.pattern,
            config.log_capacity,
            config.ratelimit_burst,
            config.ratelimit_interval
        );

        PoisonContext {
            config,
            recorder,
            counters: CheckerCounters::default(),
        }
    }
}
