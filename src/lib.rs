//! # pagepoison
//!
//! Page-level poison-and-verify integrity checking for page allocators.
//!
//! Freed pages are filled with a known byte pattern. When a page is handed
//! out again the pattern is verified:
//!
//! - Intact pattern: nothing happens.
//! - A single byte off by one bit: reported as a likely hardware fault and
//!   recorded in a bounded incident log. Filling the log is fatal.
//! - Anything else: reported with a hex dump and treated as fatal memory
//!   corruption (use-after-free, overruns).
//!
//! Reports are rate limited. This is a debug overlay; it is not meant for
//! hot allocation paths.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagepoison::{PageArena, PageChecker, PageId, PoisonConfig};
//!
//! let checker = PageChecker::with_config(PoisonConfig::from_env(), PageArena::new(64));
//!
//! // Allocator returns pages 8..12 to the free pool
//! checker.disable(PageId(8), 4);
//!
//! // ... and later hands them out again
//! checker.enable(PageId(8), 4);
//!
//! println!("{}", checker.stats());
//! ```
//!
//! ## Wiring a real allocator
//!
//! Implement [`PageMapper`], [`PageFlagStore`] and [`AddressTranslator`]
//! for your page metadata, build one [`PoisonContext`] and share it
//! through an `Arc` between every [`PageChecker`].

pub mod api;
pub mod diagnostics;
pub mod page;

mod core;
mod sync;
mod util;

// Re-export public API at crate root for convenience
pub use api::checker::PageChecker;
pub use api::config::{PoisonConfig, PAGE_POISON};
pub use api::stats::CheckerStats;

pub use crate::core::context::{PoisonContext, PoisonContextBuilder};
pub use crate::core::pattern::Extent;
pub use crate::core::recorder::CorruptionRecord;
pub use crate::core::scanner::{CorruptionScanner, ScanOutcome};

// Page capabilities
pub use page::{
    AddressTranslator, MappedPage, PageArena, PageBackend, PageDebugFlags, PageFlagStore, PageId, PageMapper,
    Protection, PAGE_SIZE,
};

// Diagnostics
pub use diagnostics::{CollectingSink, DiagnosticSink, LogSink, SinkEvent, StderrSink};
pub use diagnostics::{AbortHandler, FatalHandler, FatalMode, FatalReason, FatalReport, PanicHandler};
pub use diagnostics::{Clock, ManualClock, MonotonicClock};
