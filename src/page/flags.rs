//! Per-page debug flags.

use super::PageId;

/// Small bit-flags value kept in allocator-owned page metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PageDebugFlags(u8);

impl PageDebugFlags {
    /// No flags set.
    pub const EMPTY: Self = Self(0);

    /// The page holds the poison pattern across its whole byte range.
    pub const POISON: Self = Self(1 << 0);

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// True if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

/// Associative lookup from page identity to its debug flags.
///
/// The allocator guarantees that a single page is never poisoned and
/// unpoisoned concurrently, so implementations only need the flag word
/// itself to be safely shared, not read-modify-write atomicity.
pub trait PageFlagStore {
    /// Current flags for `page`.
    fn flags(&self, page: PageId) -> PageDebugFlags;

    /// Replace the flags for `page`.
    fn set_flags(&self, page: PageId, flags: PageDebugFlags);

    /// Whether `page` is currently marked poisoned.
    fn is_poisoned(&self, page: PageId) -> bool {
        self.flags(page).contains(PageDebugFlags::POISON)
    }

    /// Mark `page` poisoned.
    fn set_poisoned(&self, page: PageId) {
        let mut flags = self.flags(page);
        flags.insert(PageDebugFlags::POISON);
        self.set_flags(page, flags);
    }

    /// Clear the poisoned mark on `page`.
    fn clear_poisoned(&self, page: PageId) {
        let mut flags = self.flags(page);
        flags.remove(PageDebugFlags::POISON);
        self.set_flags(page, flags);
    }
}
