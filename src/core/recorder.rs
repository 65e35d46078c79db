//! Bounded incident log and escalation policy.
//!
//! Single-bit errors are kept as forensic evidence. The log never wraps:
//! once `capacity - 1` records are stored, the next single-bit error stops
//! execution. The rate limiter lives behind the same lock so that
//! concurrent detections serialize on one discipline.

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::fatal::{FatalHandler, FatalReason, FatalReport};
use crate::diagnostics::kind::{PP101, PP102};
use crate::diagnostics::ratelimit::{Clock, RateLimiter};
use crate::diagnostics::DiagnosticSink;
use crate::sync::mutex::Mutex;

/// One detected single-bit error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorruptionRecord {
    /// Virtual address of the flipped byte.
    pub virt: usize,
    /// Physical address of the flipped byte.
    pub phys: u64,
    /// Value observed at that address.
    pub byte: u8,
}

impl fmt::Display for CorruptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "virt: {:#x}, phys: {:#x}, byte: {:#04x}", self.virt, self.phys, self.byte)
    }
}

/// Result of offering a record to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Stored at this position.
    Stored(usize),
    /// No free slot; the caller must escalate.
    Exhausted,
}

/// Fixed-capacity, append-only record list.
#[derive(Debug, Clone)]
pub struct IncidentLog {
    records: Vec<CorruptionRecord>,
    capacity: usize,
}

impl IncidentLog {
    /// Create an empty log (capacity clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Vec::with_capacity(capacity - 1),
            capacity,
        }
    }

    /// Append `record` unless `capacity - 1` records are already stored.
    pub fn try_append(&mut self, record: CorruptionRecord) -> AppendOutcome {
        if self.records.len() >= self.capacity - 1 {
            return AppendOutcome::Exhausted;
        }
        self.records.push(record);
        AppendOutcome::Stored(self.records.len() - 1)
    }

    /// Stored records, oldest first.
    pub fn records(&self) -> &[CorruptionRecord] {
        &self.records
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

struct RecorderState {
    limiter: RateLimiter,
    log: IncidentLog,
}

/// Owns the incident log, the rate limiter, and the fatal path.
pub struct DiagnosticRecorder {
    state: Mutex<RecorderState>,
    sink: Arc<dyn DiagnosticSink>,
    fatal: Arc<dyn FatalHandler>,
    clock: Arc<dyn Clock>,
}

impl DiagnosticRecorder {
    /// Create a recorder.
    pub fn new(
        limiter: RateLimiter,
        log: IncidentLog,
        sink: Arc<dyn DiagnosticSink>,
        fatal: Arc<dyn FatalHandler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Mutex::new(RecorderState { limiter, log }),
            sink,
            fatal,
            clock,
        }
    }

    /// Where diagnostics go.
    pub fn sink(&self) -> &dyn DiagnosticSink {
        &*self.sink
    }

    /// Ask the rate limiter whether a report may be emitted now.
    ///
    /// When this call opens a new window after drops, a PP102 summary is
    /// emitted first.
    pub fn admit(&self) -> bool {
        let now = self.clock.now();
        let decision = self.state.lock().limiter.check(now);

        if decision.missed_in_previous_window > 0 {
            self.sink.emit(
                &PP102,
                &format!("{} reports suppressed", decision.missed_in_previous_window),
            );
        }
        decision.allowed
    }

    /// Store a single-bit record, or escalate if the log is full.
    pub fn record(&self, record: CorruptionRecord) {
        let (outcome, capacity) = {
            let mut state = self.state.lock();
            (state.log.try_append(record), state.log.capacity())
        };

        match outcome {
            AppendOutcome::Stored(index) => {
                log::debug!("recorded single bit error #{}: {}", index, record);
            }
            AppendOutcome::Exhausted => {
                self.sink.emit(&PP101, &format!("capacity {}, latest {}", capacity, record));
                self.escalate(FatalReason::IncidentLogExhausted { capacity });
            }
        }
    }

    /// Stop execution.
    pub fn escalate(&self, reason: FatalReason) -> ! {
        let report = FatalReport {
            reason,
            incidents: self.incidents(),
        };
        self.fatal.abort_with_dump(&report)
    }

    /// Snapshot of stored records, oldest first.
    pub fn incidents(&self) -> Vec<CorruptionRecord> {
        self.state.lock().log.records().to_vec()
    }

    /// Number of stored records.
    pub fn incident_count(&self) -> usize {
        self.state.lock().log.records().len()
    }

    /// Configured log capacity.
    pub fn capacity(&self) -> usize {
        self.state.lock().log.capacity()
    }
}
