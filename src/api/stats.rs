//! Checker statistics.

use crate::sync::atomics::AtomicCounter;
use crate::util::size::format_bytes;

/// Snapshot of checker activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerStats {
    /// Pages filled with the poison pattern.
    pub pages_poisoned: u64,

    /// Pages scanned on the way out of the free pool.
    pub pages_verified: u64,

    /// Pages handed out that were never poisoned.
    pub pages_skipped: u64,

    /// Verified pages that held the pattern intact.
    pub clean_pages: u64,

    /// Single-bit errors recorded.
    pub single_bit_flips: u64,

    /// General corruptions detected (each one fatal unless suppressed).
    pub general_corruptions: u64,

    /// Reports dropped by the rate limiter.
    pub reports_suppressed: u64,

    /// Bytes scanned.
    pub bytes_verified: u64,
}

impl CheckerStats {
    /// Verified pages that held anything other than the pattern.
    pub fn corrupted_pages(&self) -> u64 {
        self.pages_verified.saturating_sub(self.clean_pages)
    }
}

impl std::fmt::Display for CheckerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Poison Checker Statistics:")?;
        writeln!(f, "  Pages poisoned:      {}", self.pages_poisoned)?;
        writeln!(f, "  Pages verified:      {}", self.pages_verified)?;
        writeln!(f, "  Pages skipped:       {}", self.pages_skipped)?;
        writeln!(f, "  Clean pages:         {}", self.clean_pages)?;
        writeln!(f, "  Single bit errors:   {}", self.single_bit_flips)?;
        writeln!(f, "  General corruption:  {}", self.general_corruptions)?;
        writeln!(f, "  Reports suppressed:  {}", self.reports_suppressed)?;
        writeln!(f, "  Scanned:             {}", format_bytes(self.bytes_verified))?;
        Ok(())
    }
}

/// Live counters behind [`CheckerStats`].
#[derive(Debug, Default)]
pub(crate) struct CheckerCounters {
    pub pages_poisoned: AtomicCounter,
    pub pages_verified: AtomicCounter,
    pub pages_skipped: AtomicCounter,
    pub clean_pages: AtomicCounter,
    pub single_bit_flips: AtomicCounter,
    pub general_corruptions: AtomicCounter,
    pub reports_suppressed: AtomicCounter,
    pub bytes_verified: AtomicCounter,
}

impl CheckerCounters {
    pub fn snapshot(&self) -> CheckerStats {
        CheckerStats {
            pages_poisoned: self.pages_poisoned.get(),
            pages_verified: self.pages_verified.get(),
            pages_skipped: self.pages_skipped.get(),
            clean_pages: self.clean_pages.get(),
            single_bit_flips: self.single_bit_flips.get(),
            general_corruptions: self.general_corruptions.get(),
            reports_suppressed: self.reports_suppressed.get(),
            bytes_verified: self.bytes_verified.get(),
        }
    }
}
