//! Verification of poisoned byte ranges.
//!
//! A range that should hold only the poison pattern is searched for its
//! anomalous extent. A lone byte that differs in exactly one bit is a
//! single-bit error and gets recorded; anything wider is general corruption
//! and stops execution.

use super::context::PoisonContext;
use super::pattern::{find_extent, is_single_bit_flip, Extent};
use super::recorder::CorruptionRecord;
use crate::diagnostics::fatal::FatalReason;
use crate::diagnostics::kind::{PP001, PP002};
use crate::page::AddressTranslator;

/// What a scan found, for scans that return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The range holds the pattern intact.
    Clean,
    /// Something was wrong but the rate limiter dropped the report.
    Suppressed(Extent),
    /// A single-bit error was reported and recorded.
    SingleBitFlip(CorruptionRecord),
}

/// Scans mapped page contents against the context's poison pattern.
pub struct CorruptionScanner<'a, T: AddressTranslator + ?Sized> {
    ctx: &'a PoisonContext,
    translator: &'a T,
}

impl<'a, T: AddressTranslator + ?Sized> CorruptionScanner<'a, T> {
    /// Create a scanner reporting through `ctx`.
    pub fn new(ctx: &'a PoisonContext, translator: &'a T) -> Self {
        Self { ctx, translator }
    }

    /// Verify `bytes`, mapped at virtual address `base`.
    ///
    /// Diverges through the context's fatal handler on general corruption
    /// or when the incident log is exhausted.
    pub fn check(&self, bytes: &[u8], base: usize) -> ScanOutcome {
        let pattern = self.ctx.config().pattern;

        let Some(extent) = find_extent(bytes, pattern) else {
            return ScanOutcome::Clean;
        };

        let single_bit = extent.is_single_byte() && is_single_bit_flip(bytes[extent.start], pattern);
        let recorder = self.ctx.recorder();
        let counters = self.ctx.counters();

        if !recorder.admit() {
            if single_bit || self.ctx.config().suppress_limited_corruption {
                counters.reports_suppressed.increment();
                log::trace!("corruption report at {:#x} rate limited", base + extent.start);
                return ScanOutcome::Suppressed(extent);
            }
            // General corruption escalates even inside a limited window, but
            // without the hex dump.
            self.fail_general(bytes, base, extent, false);
        }

        if single_bit {
            let virt = base + extent.start;
            let record = CorruptionRecord {
                virt,
                phys: self.translator.virt_to_phys(virt),
                byte: bytes[extent.start],
            };

            recorder.sink().emit(&PP001, &format!("virt: {:#x}, phys: {:#x}", record.virt, record.phys));
            counters.single_bit_flips.increment();
            recorder.record(record);
            return ScanOutcome::SingleBitFlip(record);
        }

        self.fail_general(bytes, base, extent, true)
    }

    fn fail_general(&self, bytes: &[u8], base: usize, extent: Extent, dump: bool) -> ! {
        let virt = base + extent.start;
        let phys = self.translator.virt_to_phys(virt);
        let recorder = self.ctx.recorder();

        self.ctx.counters().general_corruptions.increment();
        recorder.sink().emit(
            &PP002,
            &format!("virt: {:#x}, phys: {:#x}, {} byte(s)", virt, phys, extent.len()),
        );
        if dump {
            recorder.sink().emit_hex_dump(virt, &bytes[extent.start..=extent.end]);
        }

        recorder.escalate(FatalReason::GeneralCorruption {
            virt,
            phys,
            len: extent.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::PoisonConfig;
    use crate::diagnostics::{CollectingSink, ManualClock, PanicHandler, SinkEvent};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;

    struct Offset(u64);

    impl AddressTranslator for Offset {
        fn virt_to_phys(&self, virt: usize) -> u64 {
            virt as u64 + self.0
        }
    }

    fn context(config: PoisonConfig, sink: Arc<CollectingSink>) -> PoisonContext {
        PoisonContext::builder(config)
            .with_sink(sink)
            .with_fatal_handler(Arc::new(PanicHandler))
            .with_clock(Arc::new(ManualClock::new()))
            .build()
    }

    #[test]
    fn test_clean_range() {
        let sink = Arc::new(CollectingSink::new());
        let ctx = context(PoisonConfig::testing(), sink.clone());
        let buf = [0xaau8; 128];

        let outcome = CorruptionScanner::new(&ctx, &Offset(0)).check(&buf, 0x4000);
        assert_eq!(outcome, ScanOutcome::Clean);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_single_bit_flip_is_recorded() {
        let sink = Arc::new(CollectingSink::new());
        let ctx = context(PoisonConfig::testing(), sink.clone());
        let mut buf = [0xaau8; 128];
        buf[17] = 0xa8;

        let outcome = CorruptionScanner::new(&ctx, &Offset(0x100)).check(&buf, 0x4000);
        let expected = CorruptionRecord { virt: 0x4011, phys: 0x4111, byte: 0xa8 };
        assert_eq!(outcome, ScanOutcome::SingleBitFlip(expected));
        assert_eq!(ctx.incidents(), vec![expected]);
        assert_eq!(
            sink.events(),
            vec![SinkEvent::Diagnostic {
                code: "PP001",
                kind: crate::diagnostics::DiagnosticKind::Error,
                detail: "virt: 0x4011, phys: 0x4111".to_string(),
            }]
        );
    }

    #[test]
    fn test_multi_bit_byte_is_fatal_with_dump() {
        let sink = Arc::new(CollectingSink::new());
        let ctx = context(PoisonConfig::testing(), sink.clone());
        let mut buf = [0xaau8; 64];
        buf[5] = 0x55;

        let result = catch_unwind(AssertUnwindSafe(|| {
            CorruptionScanner::new(&ctx, &Offset(0)).check(&buf, 0x1000)
        }));
        assert!(result.is_err());
        assert_eq!(ctx.incident_count(), 0);
        assert_eq!(ctx.stats().general_corruptions, 1);
        assert_eq!(sink.codes(), vec!["PP002"]);
        assert!(sink
            .events()
            .contains(&SinkEvent::HexDump { addr: 0x1005, bytes: vec![0x55] }));
    }

    #[test]
    fn test_limited_general_corruption_still_fatal() {
        let sink = Arc::new(CollectingSink::new());
        let config = PoisonConfig::testing().with_ratelimit(std::time::Duration::from_secs(5), 0);
        let ctx = context(config, sink.clone());
        let mut buf = [0xaau8; 64];
        buf[0] = 0;
        buf[63] = 0;

        let result = catch_unwind(AssertUnwindSafe(|| {
            CorruptionScanner::new(&ctx, &Offset(0)).check(&buf, 0)
        }));
        assert!(result.is_err());
        assert!(!sink.events().iter().any(|e| matches!(e, SinkEvent::HexDump { .. })));
    }

    #[test]
    fn test_limited_general_corruption_suppressed_when_configured() {
        let sink = Arc::new(CollectingSink::new());
        let config = PoisonConfig::testing()
            .with_ratelimit(std::time::Duration::from_secs(5), 0)
            .with_limited_corruption_suppressed(true);
        let ctx = context(config, sink.clone());
        let mut buf = [0xaau8; 64];
        buf[2] = 0;
        buf[9] = 0;

        let outcome = CorruptionScanner::new(&ctx, &Offset(0)).check(&buf, 0);
        assert_eq!(outcome, ScanOutcome::Suppressed(Extent { start: 2, end: 9 }));
        assert!(sink.is_empty());
        assert_eq!(ctx.stats().reports_suppressed, 1);
    }
}
