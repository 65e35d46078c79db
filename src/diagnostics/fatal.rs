//! Fatal escalation.
//!
//! Detected corruption that cannot be tolerated stops execution through a
//! [`FatalHandler`]. Handlers never return.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::core::recorder::CorruptionRecord;

/// Environment variable selecting the fatal mode.
pub const FATAL_MODE_ENV: &str = "PAGEPOISON_FATAL";

/// Why execution is being stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalReason {
    /// A poisoned page held something other than a single-bit flip.
    GeneralCorruption {
        /// Virtual address of the first corrupted byte.
        virt: usize,
        /// Physical address of the first corrupted byte.
        phys: u64,
        /// Length of the corrupted extent in bytes.
        len: usize,
    },
    /// The single-bit incident log has no free slot left.
    IncidentLogExhausted {
        /// Configured log capacity.
        capacity: usize,
    },
}

/// Everything known at the moment of a fatal stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalReport {
    /// What triggered the stop.
    pub reason: FatalReason,
    /// Single-bit incidents recorded so far, oldest first.
    pub incidents: Vec<CorruptionRecord>,
}

impl fmt::Display for FatalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FatalReason::GeneralCorruption { virt, phys, len } => write!(
                f,
                "pagepoison: memory corruption of {} byte(s) at virt: {:#x}, phys: {:#x}",
                len, virt, phys
            )?,
            FatalReason::IncidentLogExhausted { capacity } => write!(
                f,
                "pagepoison: single bit error log exhausted (capacity {})",
                capacity
            )?,
        }

        for (i, rec) in self.incidents.iter().enumerate() {
            write!(f, "\n  incident {}: {}", i, rec)?;
        }
        Ok(())
    }
}

/// Irrecoverable stop primitive.
pub trait FatalHandler: Send + Sync {
    /// Stop execution after dumping `report`.
    fn abort_with_dump(&self, report: &FatalReport) -> !;
}

/// Dumps the report and a backtrace to stderr and the log, then aborts.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortHandler;

impl FatalHandler for AbortHandler {
    fn abort_with_dump(&self, report: &FatalReport) -> ! {
        let trace = capture_backtrace();
        log::error!("{}", report);

        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", report);
        let _ = writeln!(stderr, "stack backtrace:\n{}", trace);
        let _ = stderr.flush();

        std::process::abort()
    }
}

/// Panics with the report text.
///
/// Fatal paths unwind instead of aborting; suited to tests and to hosts
/// that install their own panic hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicHandler;

impl FatalHandler for PanicHandler {
    fn abort_with_dump(&self, report: &FatalReport) -> ! {
        log::error!("{}", report);
        panic!("{}", report)
    }
}

/// Built-in fatal behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FatalMode {
    /// Abort the process.
    #[default]
    Abort,
    /// Panic (unwinds).
    Panic,
}

impl FatalMode {
    /// Handler implementing this mode.
    pub fn handler(self) -> Arc<dyn FatalHandler> {
        match self {
            FatalMode::Abort => Arc::new(AbortHandler),
            FatalMode::Panic => Arc::new(PanicHandler),
        }
    }

    /// Parse a mode name.
    ///
    /// - "abort" or "0" -> Abort
    /// - "panic" or "1" -> Panic
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "abort" | "0" => Some(FatalMode::Abort),
            "panic" | "1" => Some(FatalMode::Panic),
            _ => None,
        }
    }

    /// Read the mode from `PAGEPOISON_FATAL`, if set and valid.
    pub fn from_env() -> Option<Self> {
        let value = std::env::var(FATAL_MODE_ENV).ok()?;
        let mode = Self::parse(&value);
        if mode.is_none() {
            log::warn!("ignoring unknown {}={:?}", FATAL_MODE_ENV, value);
        }
        mode
    }
}

/// Current stack trace, rendered.
fn capture_backtrace() -> String {
    #[cfg(feature = "debug")]
    {
        format!("{:?}", backtrace::Backtrace::new())
    }

    #[cfg(not(feature = "debug"))]
    {
        std::backtrace::Backtrace::force_capture().to_string()
    }
}
