//! Address translation for diagnostic reports.

/// Translates a mapped virtual address to the physical address behind it.
///
/// Only used to label corruption reports.
pub trait AddressTranslator {
    /// Physical address backing `virt`.
    fn virt_to_phys(&self, virt: usize) -> u64;
}
