//! Poisoning and verification of page runs.
//!
//! Pages are touched one at a time, in ascending order, through a
//! [`MappedPage`] guard so the mapping is released on every exit path.

use super::context::PoisonContext;
use super::pattern::fill;
use super::scanner::{CorruptionScanner, ScanOutcome};
use crate::page::{MappedPage, PageBackend, PageId, Protection};

/// Fill `count` pages starting at `start` with the poison pattern and mark
/// them poisoned.
pub(crate) fn poison_pages<B: PageBackend + ?Sized>(
    ctx: &PoisonContext,
    backend: &B,
    start: PageId,
    count: usize,
) {
    log::trace!("poisoning {} page(s) from {}", count, start);
    for i in 0..count {
        poison_page(ctx, backend, start.offset(i));
    }
}

fn poison_page<B: PageBackend + ?Sized>(ctx: &PoisonContext, backend: &B, page: PageId) {
    let config = ctx.config();
    let mut mapped = MappedPage::map(backend, page);

    // Re-poisoning a protected page must not trap.
    if config.protect_pages && backend.is_poisoned(page) {
        mapped.protect(Protection::ReadWrite);
    }

    backend.set_poisoned(page);
    fill(mapped.as_mut_slice(), config.pattern);

    if config.protect_pages {
        mapped.protect(Protection::ReadOnly);
    }
    ctx.counters().pages_poisoned.increment();
}

/// Verify and clear poisoning on `count` pages starting at `start`.
pub(crate) fn unpoison_pages<B: PageBackend + ?Sized>(
    ctx: &PoisonContext,
    backend: &B,
    start: PageId,
    count: usize,
) {
    log::trace!("unpoisoning {} page(s) from {}", count, start);
    for i in 0..count {
        unpoison_page(ctx, backend, start.offset(i));
    }
}

/// Returns `None` when the page was never poisoned.
fn unpoison_page<B: PageBackend + ?Sized>(
    ctx: &PoisonContext,
    backend: &B,
    page: PageId,
) -> Option<ScanOutcome> {
    let counters = ctx.counters();

    if !backend.is_poisoned(page) {
        counters.pages_skipped.increment();
        return None;
    }

    let mapped = MappedPage::map(backend, page);
    let outcome = CorruptionScanner::new(ctx, backend).check(mapped.as_slice(), mapped.addr());

    if ctx.config().protect_pages {
        mapped.protect(Protection::ReadWrite);
    }
    backend.clear_poisoned(page);
    drop(mapped);

    counters.pages_verified.increment();
    counters.bytes_verified.add(backend.page_size() as u64);
    if outcome == ScanOutcome::Clean {
        counters.clean_pages.increment();
    } else {
        log::debug!("{} verified with {:?}", page, outcome);
    }

    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::PoisonConfig;
    use crate::diagnostics::{CollectingSink, ManualClock, PanicHandler};
    use crate::page::{PageArena, PageFlagStore};
    use std::sync::Arc;

    fn context() -> PoisonContext {
        PoisonContext::builder(PoisonConfig::default().with_fatal_mode(crate::diagnostics::FatalMode::Panic))
            .with_sink(Arc::new(CollectingSink::new()))
            .with_fatal_handler(Arc::new(PanicHandler))
            .with_clock(Arc::new(ManualClock::new()))
            .build()
    }

    #[test]
    fn test_poison_fills_and_protects() {
        let ctx = context();
        let mut arena = PageArena::with_page_size(3, 128);

        poison_pages(&ctx, &arena, PageId(1), 2);

        assert!(!arena.is_poisoned(PageId(0)));
        assert!(arena.is_poisoned(PageId(1)));
        assert!(arena.is_read_only(PageId(2)));
        assert!(arena.page_bytes(PageId(2)).iter().all(|&b| b == 0xaa));
        assert!(arena.page_bytes(PageId(0)).iter().all(|&b| b == 0));
        assert_eq!(arena.map_count(), arena.unmap_count());
    }

    #[test]
    fn test_unpoison_restores_access() {
        let ctx = context();
        let arena = PageArena::with_page_size(1, 128);

        poison_pages(&ctx, &arena, PageId(0), 1);
        let outcome = unpoison_page(&ctx, &arena, PageId(0));

        assert_eq!(outcome, Some(ScanOutcome::Clean));
        assert!(!arena.is_poisoned(PageId(0)));
        assert!(!arena.is_read_only(PageId(0)));
        assert!(!arena.is_mapped(PageId(0)));
    }

    #[test]
    fn test_unpoison_skips_unpoisoned_page() {
        let ctx = context();
        let arena = PageArena::with_page_size(1, 128);

        assert_eq!(unpoison_page(&ctx, &arena, PageId(0)), None);
        assert_eq!(arena.map_count(), 0);
        assert_eq!(ctx.stats().pages_skipped, 1);
    }
}
