//! Transient page mappings.

use std::ptr::NonNull;

use super::PageId;

/// Access protection applied to a mapped page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Writes trap.
    ReadOnly,
    /// Normal access.
    ReadWrite,
}

/// Maps pages into addressable memory for the duration of a byte-level touch.
///
/// # Safety
///
/// Implementors guarantee that the pointer returned by [`map`](Self::map)
/// is valid for reads and writes of [`page_size`](Self::page_size) bytes
/// until the matching [`unmap`](Self::unmap), and that nothing else accesses
/// those bytes in that window. In particular `map` must panic rather than
/// return a second live mapping of the same page.
pub unsafe trait PageMapper {
    /// Size of every page in bytes.
    fn page_size(&self) -> usize;

    /// Obtain a writable address for `page`.
    fn map(&self, page: PageId) -> NonNull<u8>;

    /// Release a mapping obtained from [`map`](Self::map).
    ///
    /// # Safety
    ///
    /// `addr` must come from `map(page)` and must not be used afterwards.
    unsafe fn unmap(&self, page: PageId, addr: NonNull<u8>);

    /// Change protection of a mapped page.
    ///
    /// Platforms without page protection keep the default no-op.
    fn protect(&self, page: PageId, addr: NonNull<u8>, protection: Protection) {
        let _ = (page, addr, protection);
    }
}

/// A page mapped for the lifetime of the guard.
///
/// Dropping the guard unmaps the page on every exit path, including
/// unwinding out of a fatal report.
pub struct MappedPage<'a, M: PageMapper + ?Sized> {
    mapper: &'a M,
    page: PageId,
    addr: NonNull<u8>,
    len: usize,
}

impl<'a, M: PageMapper + ?Sized> MappedPage<'a, M> {
    /// Map `page` through `mapper`.
    pub fn map(mapper: &'a M, page: PageId) -> Self {
        let addr = mapper.map(page);
        Self {
            mapper,
            page,
            addr,
            len: mapper.page_size(),
        }
    }

    /// The mapped page.
    pub fn page(&self) -> PageId {
        self.page
    }

    /// Virtual address of the first byte.
    pub fn addr(&self) -> usize {
        self.addr.as_ptr() as usize
    }

    /// Page contents.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: PageMapper contract: valid for `len` bytes while mapped,
        // and the guard is the only accessor.
        unsafe { std::slice::from_raw_parts(self.addr.as_ptr(), self.len) }
    }

    /// Mutable page contents.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above; `&mut self` makes the borrow exclusive.
        unsafe { std::slice::from_raw_parts_mut(self.addr.as_ptr(), self.len) }
    }

    /// Change the protection of the mapped range.
    pub fn protect(&self, protection: Protection) {
        self.mapper.protect(self.page, self.addr, protection);
    }
}

impl<M: PageMapper + ?Sized> Drop for MappedPage<'_, M> {
    fn drop(&mut self) {
        // SAFETY: `addr` came from `map(self.page)` and dies with the guard.
        unsafe { self.mapper.unmap(self.page, self.addr) };
    }
}
