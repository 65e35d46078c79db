//! Allocator-facing entry points.

use std::sync::Arc;

use crate::api::config::PoisonConfig;
use crate::api::stats::CheckerStats;
use crate::core::context::PoisonContext;
use crate::core::poisoner::{poison_pages, unpoison_pages};
use crate::page::{PageBackend, PageId};

/// Poison-and-verify overlay for one page backend.
///
/// The allocator calls [`disable`](Self::disable) when pages return to the
/// free pool and [`enable`](Self::enable) before handing them to a client.
/// Disjoint page runs may be processed from several threads at once; the
/// allocator must never pass the same page to two concurrent calls.
///
/// # Example
///
/// ```rust,no_run
/// use pagepoison::{PageArena, PageChecker, PageId, PoisonConfig};
///
/// let checker = PageChecker::with_config(PoisonConfig::default(), PageArena::new(16));
///
/// checker.disable(PageId(0), 4); // freed: poison
/// checker.enable(PageId(0), 4);  // allocated: verify
/// ```
pub struct PageChecker<B> {
    ctx: Arc<PoisonContext>,
    backend: B,
}

impl<B: PageBackend> PageChecker<B> {
    /// Create a checker sharing an existing context.
    pub fn new(ctx: Arc<PoisonContext>, backend: B) -> Self {
        Self { ctx, backend }
    }

    /// Create a checker with a fresh context built from `config`.
    pub fn with_config(config: PoisonConfig, backend: B) -> Self {
        Self::new(Arc::new(PoisonContext::new(config)), backend)
    }

    /// Pages are being handed to a client: verify and clear poisoning.
    pub fn enable(&self, start: PageId, count: usize) {
        unpoison_pages(&self.ctx, &self.backend, start, count);
    }

    /// Pages are being returned to the free pool: poison them.
    pub fn disable(&self, start: PageId, count: usize) {
        poison_pages(&self.ctx, &self.backend, start, count);
    }

    /// Single entry point: `enable` selects verification, otherwise poisoning.
    pub fn map_pages(&self, start: PageId, count: usize, enable: bool) {
        if enable {
            self.enable(start, count);
        } else {
            self.disable(start, count);
        }
    }

    /// Whether `page` is currently poisoned.
    pub fn is_poisoned(&self, page: PageId) -> bool {
        self.backend.is_poisoned(page)
    }

    /// Snapshot of activity counters.
    pub fn stats(&self) -> CheckerStats {
        self.ctx.stats()
    }
}

impl<B> PageChecker<B> {
    /// Shared checker state.
    pub fn context(&self) -> &Arc<PoisonContext> {
        &self.ctx
    }

    /// The page backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the page backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Consume the checker, returning the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }
}
