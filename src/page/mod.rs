//! Page-level capabilities supplied by the allocator.
//!
//! The checker never owns pages. It reaches them through three narrow
//! capabilities, each implemented by whatever wires the allocator to the
//! checker:
//!
//! - [`PageFlagStore`]: out-of-band debug flags per page
//! - [`PageMapper`]: transient mapping of a page into addressable memory
//! - [`AddressTranslator`]: virtual to physical translation for reports
//!
//! [`PageArena`] implements all three over a heap-backed page range.

mod arena;
mod flags;
mod mapping;
mod translate;

pub use arena::PageArena;
pub use flags::{PageDebugFlags, PageFlagStore};
pub use mapping::{MappedPage, PageMapper, Protection};
pub use translate::AddressTranslator;

use crate::util::size::kb;

/// Default page size in bytes.
pub const PAGE_SIZE: usize = kb(4);

/// Identity of a page as understood by the allocator (a frame number).
///
/// Runs of pages are addressed by their first page and a count; page
/// `n` of a run starting at `p` is `p.offset(n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(pub usize);

impl PageId {
    /// The page `n` frames after this one.
    #[inline]
    pub const fn offset(self, n: usize) -> Self {
        Self(self.0 + n)
    }

    /// Frame number.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page#{}", self.0)
    }
}

/// Everything the checker needs from a page backend.
///
/// Blanket-implemented for any type providing the three capabilities.
pub trait PageBackend: PageMapper + PageFlagStore + AddressTranslator {}

impl<T> PageBackend for T where T: PageMapper + PageFlagStore + AddressTranslator + ?Sized {}
