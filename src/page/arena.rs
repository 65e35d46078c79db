//! Heap-backed page range implementing every page capability.
//!
//! Useful for hosted allocators built on top of a fixed page pool and for
//! exercising the checker without a kernel. Protection is tracked, not
//! enforced by hardware.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use super::{AddressTranslator, PageDebugFlags, PageFlagStore, PageId, PageMapper, Protection, PAGE_SIZE};
use crate::sync::atomics::AtomicCounter;

/// Default fake physical base reported by [`PageArena::new`].
const DEFAULT_PHYS_BASE: u64 = 0x8000_0000;

/// A contiguous, page-aligned run of zeroed pages.
pub struct PageArena {
    /// Base of the allocation
    base: NonNull<u8>,

    /// Layout used for the allocation
    layout: Layout,

    page_size: usize,
    page_count: usize,

    /// Physical address reported for the first byte
    phys_base: u64,

    /// Out-of-band debug flags, one word per page
    flags: Box<[AtomicU8]>,

    /// Tracked protection state
    read_only: Box<[AtomicBool]>,

    /// Pages currently mapped
    mapped: Box<[AtomicBool]>,

    maps: AtomicCounter,
    unmaps: AtomicCounter,
}

impl PageArena {
    /// Allocate `page_count` pages of [`PAGE_SIZE`] bytes.
    pub fn new(page_count: usize) -> Self {
        Self::with_page_size(page_count, PAGE_SIZE)
    }

    /// Allocate `page_count` pages of `page_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two, if `page_count` is zero,
    /// or if the total size overflows.
    pub fn with_page_size(page_count: usize, page_size: usize) -> Self {
        assert!(page_size.is_power_of_two(), "page size must be a power of two");
        assert!(page_count > 0, "arena needs at least one page");

        let total = page_count
            .checked_mul(page_size)
            .expect("arena size overflows usize");
        let layout = Layout::from_size_align(total, page_size).expect("invalid arena layout");

        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        let Some(base) = NonNull::new(ptr) else {
            handle_alloc_error(layout);
        };

        Self {
            base,
            layout,
            page_size,
            page_count,
            phys_base: DEFAULT_PHYS_BASE,
            flags: (0..page_count).map(|_| AtomicU8::new(0)).collect(),
            read_only: (0..page_count).map(|_| AtomicBool::new(false)).collect(),
            mapped: (0..page_count).map(|_| AtomicBool::new(false)).collect(),
            maps: AtomicCounter::default(),
            unmaps: AtomicCounter::default(),
        }
    }

    /// Builder pattern: set the physical address reported for the first byte.
    pub fn with_phys_base(mut self, phys_base: u64) -> Self {
        self.phys_base = phys_base;
        self
    }

    /// Number of pages in the arena.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Virtual address of the first byte of `page`.
    pub fn page_addr(&self, page: PageId) -> usize {
        self.base.as_ptr() as usize + self.index(page) * self.page_size
    }

    /// Direct access to a page's bytes, bypassing protection.
    ///
    /// Simulates stray writes and hardware faults in tests. Taking `&mut self`
    /// guarantees no mapping guard is alive.
    pub fn page_bytes(&mut self, page: PageId) -> &mut [u8] {
        let offset = self.index(page) * self.page_size;
        // SAFETY: offset + page_size lies inside the allocation and the
        // exclusive borrow rules out live mappings.
        unsafe { std::slice::from_raw_parts_mut(self.base.as_ptr().add(offset), self.page_size) }
    }

    /// Whether `page` is currently protected read-only.
    pub fn is_read_only(&self, page: PageId) -> bool {
        self.read_only[self.index(page)].load(Ordering::Relaxed)
    }

    /// Whether `page` is currently mapped.
    pub fn is_mapped(&self, page: PageId) -> bool {
        self.mapped[self.index(page)].load(Ordering::Acquire)
    }

    /// Total `map` calls served.
    pub fn map_count(&self) -> u64 {
        self.maps.get()
    }

    /// Total `unmap` calls served.
    pub fn unmap_count(&self) -> u64 {
        self.unmaps.get()
    }

    fn index(&self, page: PageId) -> usize {
        assert!(
            page.index() < self.page_count,
            "{} outside arena of {} pages",
            page,
            self.page_count
        );
        page.index()
    }
}

impl Drop for PageArena {
    fn drop(&mut self) {
        // SAFETY: allocated in `with_page_size` with this exact layout.
        unsafe { dealloc(self.base.as_ptr(), self.layout) };
    }
}

// SAFETY: the arena owns its allocation; shared access to page bytes only
// happens through PageMapper, whose callers hold per-page exclusivity, and
// all bookkeeping is atomic.
unsafe impl Send for PageArena {}
unsafe impl Sync for PageArena {}

// SAFETY: every page lies inside the live allocation for the arena's
// lifetime, and the `mapped` flags refuse a second live mapping of a page.
unsafe impl PageMapper for PageArena {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn map(&self, page: PageId) -> NonNull<u8> {
        let idx = self.index(page);
        let was_mapped = self.mapped[idx].swap(true, Ordering::AcqRel);
        assert!(!was_mapped, "{} mapped twice", page);
        self.maps.increment();

        // SAFETY: idx < page_count, so the offset stays in bounds.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(idx * self.page_size)) }
    }

    unsafe fn unmap(&self, page: PageId, addr: NonNull<u8>) {
        debug_assert_eq!(addr.as_ptr() as usize, self.page_addr(page));
        self.mapped[self.index(page)].store(false, Ordering::Release);
        self.unmaps.increment();
    }

    fn protect(&self, page: PageId, _addr: NonNull<u8>, protection: Protection) {
        self.read_only[self.index(page)].store(protection == Protection::ReadOnly, Ordering::Relaxed);
    }
}

impl PageFlagStore for PageArena {
    fn flags(&self, page: PageId) -> PageDebugFlags {
        PageDebugFlags::from_bits(self.flags[self.index(page)].load(Ordering::Relaxed))
    }

    fn set_flags(&self, page: PageId, flags: PageDebugFlags) {
        self.flags[self.index(page)].store(flags.bits(), Ordering::Relaxed);
    }
}

impl AddressTranslator for PageArena {
    fn virt_to_phys(&self, virt: usize) -> u64 {
        let offset = virt.wrapping_sub(self.base.as_ptr() as usize) as u64;
        self.phys_base.wrapping_add(offset)
    }
}
