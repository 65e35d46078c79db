//! Integration tests for pagepoison.

use pagepoison::{
    CollectingSink, CorruptionRecord, ManualClock, PageArena, PageChecker, PageId, PanicHandler, PoisonConfig,
    PoisonContext, SinkEvent,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PAGE: usize = 256;
const WINDOW: Duration = Duration::from_secs(5);

struct Harness {
    checker: PageChecker<PageArena>,
    sink: Arc<CollectingSink>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new(config: PoisonConfig, pages: usize) -> Self {
        let sink = Arc::new(CollectingSink::new());
        let clock = Arc::new(ManualClock::new());
        let ctx = PoisonContext::builder(config)
            .with_sink(sink.clone())
            .with_fatal_handler(Arc::new(PanicHandler))
            .with_clock(clock.clone())
            .build();

        Self {
            checker: PageChecker::new(Arc::new(ctx), PageArena::with_page_size(pages, PAGE)),
            sink,
            clock,
        }
    }

    fn ctx(&self) -> &PoisonContext {
        self.checker.context()
    }

    fn addr(&self, page: usize, offset: usize) -> usize {
        self.checker.backend().page_addr(PageId(page)) + offset
    }

    fn flip(&mut self, page: usize, offset: usize, mask: u8) {
        self.checker.backend_mut().page_bytes(PageId(page))[offset] ^= mask;
    }

    fn bytes(&mut self, page: usize) -> Vec<u8> {
        self.checker.backend_mut().page_bytes(PageId(page)).to_vec()
    }

    /// Run `enable` and report whether it escalated.
    fn enable_is_fatal(&self, page: usize, count: usize) -> bool {
        catch_unwind(AssertUnwindSafe(|| self.checker.enable(PageId(page), count))).is_err()
    }
}

#[test]
fn test_poisoning_is_idempotent() {
    let mut h = Harness::new(PoisonConfig::default(), 2);

    h.checker.disable(PageId(0), 1);
    h.checker.disable(PageId(0), 1);

    assert!(h.checker.is_poisoned(PageId(0)));
    assert!(h.bytes(0).iter().all(|&b| b == 0xaa));
    assert!(h.checker.backend().is_read_only(PageId(0)));
}

#[test]
fn test_round_trip_reports_nothing() {
    let h = Harness::new(PoisonConfig::default(), 4);

    h.checker.disable(PageId(0), 4);
    h.checker.enable(PageId(0), 4);

    assert!((0..4).all(|i| !h.checker.is_poisoned(PageId(i))));
    assert!((0..4).all(|i| !h.checker.backend().is_read_only(PageId(i))));
    assert!(h.sink.is_empty());
    assert_eq!(h.ctx().incident_count(), 0);

    let stats = h.checker.stats();
    assert_eq!(stats.pages_verified, 4);
    assert_eq!(stats.clean_pages, 4);
    assert_eq!(stats.corrupted_pages(), 0);
}

#[test]
fn test_single_bit_flip_detected_and_recorded() {
    let mut h = Harness::new(PoisonConfig::default(), 2);

    h.checker.disable(PageId(1), 1);
    h.flip(1, 100, 0x10);
    h.checker.enable(PageId(1), 1);

    let virt = h.addr(1, 100);
    let phys = 0x8000_0000 + (PAGE + 100) as u64;
    assert_eq!(h.ctx().incidents(), vec![CorruptionRecord { virt, phys, byte: 0xba }]);
    assert_eq!(h.sink.codes(), vec!["PP001"]);
    assert!(!h.checker.is_poisoned(PageId(1)));
    assert_eq!(h.checker.stats().single_bit_flips, 1);
}

#[test]
fn test_two_distant_bytes_are_fatal() {
    let mut h = Harness::new(PoisonConfig::default(), 1);

    h.checker.disable(PageId(0), 1);
    h.flip(0, 3, 0x01);
    h.flip(0, 200, 0x01);

    assert!(h.enable_is_fatal(0, 1));
    assert_eq!(h.ctx().incident_count(), 0);
    assert_eq!(h.sink.codes(), vec!["PP002"]);

    let dump = h.sink.events().into_iter().find_map(|e| match e {
        SinkEvent::HexDump { addr, bytes } => Some((addr, bytes)),
        _ => None,
    });
    let (addr, bytes) = dump.unwrap_or_default();
    assert_eq!(addr, h.addr(0, 3));
    assert_eq!(bytes.len(), 198);
    assert_eq!(bytes[0], 0xab);
    assert_eq!(bytes[197], 0xab);

    // The guard released the mapping while unwinding.
    assert!(!h.checker.backend().is_mapped(PageId(0)));
}

#[test]
fn test_multi_bit_single_byte_is_fatal() {
    let mut h = Harness::new(PoisonConfig::default(), 1);

    h.checker.disable(PageId(0), 1);
    h.flip(0, 0, 0x03);

    assert!(h.enable_is_fatal(0, 1));
    assert_eq!(h.ctx().incident_count(), 0);
    assert_eq!(h.checker.stats().general_corruptions, 1);
}

#[test]
fn test_log_capacity_escalates() {
    let config = PoisonConfig::default();
    let capacity = config.log_capacity;
    let mut h = Harness::new(config, capacity);

    h.checker.disable(PageId(0), capacity);
    for page in 0..capacity {
        h.flip(page, page * 7, 0x80);
    }

    for page in 0..capacity - 1 {
        h.checker.enable(PageId(page), 1);
        h.clock.advance(WINDOW + Duration::from_millis(1));
    }
    assert_eq!(h.ctx().incident_count(), capacity - 1);

    assert!(h.enable_is_fatal(capacity - 1, 1));
    assert_eq!(h.ctx().incident_count(), capacity - 1);
    assert_eq!(h.sink.codes().last(), Some(&"PP101"));

    let recorded: Vec<_> = h.ctx().incidents().iter().map(|r| r.virt).collect();
    let expected: Vec<_> = (0..capacity - 1).map(|p| h.addr(p, p * 7)).collect();
    assert_eq!(recorded, expected);
}

#[test]
fn test_rate_limit_drops_excess_reports() {
    let config = PoisonConfig::default().with_ratelimit(WINDOW, 3);
    let mut h = Harness::new(config, 6);

    h.checker.disable(PageId(0), 6);
    for page in 0..6 {
        h.flip(page, 1, 0x04);
    }
    h.checker.enable(PageId(0), 6);

    assert_eq!(h.ctx().incident_count(), 3);
    assert_eq!(h.sink.codes(), vec!["PP001"; 3]);
    assert_eq!(h.checker.stats().reports_suppressed, 3);
    assert!((0..6).all(|i| !h.checker.is_poisoned(PageId(i))));

    // The next window opens with a summary of the drops.
    h.checker.disable(PageId(0), 1);
    h.flip(0, 1, 0x04);
    h.clock.advance(WINDOW + Duration::from_millis(1));
    h.checker.enable(PageId(0), 1);

    assert_eq!(h.sink.codes()[3..], ["PP102", "PP001"]);
    assert_eq!(h.ctx().incident_count(), 4);
}

#[test]
fn test_unbounded_rate_window_still_records() {
    let config = PoisonConfig::default().with_ratelimit(Duration::MAX, 10);
    let mut h = Harness::new(config, 1);

    h.clock.advance(Duration::from_secs(1));
    h.checker.disable(PageId(0), 1);
    h.flip(0, 9, 0x40);
    h.checker.enable(PageId(0), 1);

    assert_eq!(h.ctx().incident_count(), 1);
    assert_eq!(h.sink.codes(), vec!["PP001"]);
}

#[test]
fn test_unpoisoned_page_is_untouched() {
    let h = Harness::new(PoisonConfig::default(), 2);

    h.checker.enable(PageId(0), 2);

    assert_eq!(h.checker.backend().map_count(), 0);
    assert!(h.sink.is_empty());
    assert_eq!(h.checker.stats().pages_skipped, 2);
}

#[test]
fn test_concurrent_runs_share_one_log() {
    let config = PoisonConfig::default().without_ratelimit().with_log_capacity(64);
    let mut h = Harness::new(config, 32);

    h.checker.disable(PageId(0), 32);
    for page in 0..32 {
        h.flip(page, page, 0x02);
    }

    let checker = &h.checker;
    thread::scope(|s| {
        for t in 0..4 {
            s.spawn(move || checker.enable(PageId(t * 8), 8));
        }
    });

    assert_eq!(h.ctx().incident_count(), 32);
    assert_eq!(h.checker.stats().single_bit_flips, 32);

    let mut virts: Vec<_> = h.ctx().incidents().iter().map(|r| r.virt).collect();
    virts.sort_unstable();
    virts.dedup();
    assert_eq!(virts.len(), 32);
}

#[test]
fn test_concurrent_detections_cannot_overfill_log() {
    let config = PoisonConfig::default().without_ratelimit().with_log_capacity(5);
    let mut h = Harness::new(config, 16);

    h.checker.disable(PageId(0), 16);
    for page in 0..16 {
        h.flip(page, 0, 0x01);
    }

    let checker = &h.checker;
    let fatal = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|p| {
                s.spawn(move || {
                    catch_unwind(AssertUnwindSafe(|| checker.enable(PageId(p), 1))).is_err()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .filter(|r| matches!(r, Ok(true)))
            .count()
    });

    assert_eq!(h.ctx().incident_count(), 4);
    assert_eq!(fatal, 12);
}
