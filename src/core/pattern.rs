//! Poison pattern fill and search.
//!
//! Searches compare a machine word at a time and fall back to bytes for
//! the unaligned head and tail.

const WORD: usize = std::mem::size_of::<u64>();

/// An anomalous byte range inside a scanned region, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// Offset of the first byte that differs from the pattern.
    pub start: usize,
    /// Offset of the last byte that differs from the pattern.
    pub end: usize,
}

impl Extent {
    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Whether the extent is a single byte.
    pub fn is_single_byte(&self) -> bool {
        self.start == self.end
    }
}

/// Fill `bytes` with `pattern`.
#[inline]
pub fn fill(bytes: &mut [u8], pattern: u8) {
    bytes.fill(pattern);
}

/// Offset of the first byte that is not `pattern`.
pub fn first_mismatch(bytes: &[u8], pattern: u8) -> Option<usize> {
    let splat = u64::from_ne_bytes([pattern; WORD]);
    let words = bytes.chunks_exact(WORD);
    let tail_start = bytes.len() - words.remainder().len();

    for (i, word) in words.enumerate() {
        let mut w = [0u8; WORD];
        w.copy_from_slice(word);
        if u64::from_ne_bytes(w) != splat {
            let base = i * WORD;
            return word.iter().position(|&b| b != pattern).map(|p| base + p);
        }
    }

    bytes[tail_start..]
        .iter()
        .position(|&b| b != pattern)
        .map(|p| tail_start + p)
}

/// Offset of the last byte that is not `pattern`.
pub fn last_mismatch(bytes: &[u8], pattern: u8) -> Option<usize> {
    bytes.iter().rposition(|&b| b != pattern)
}

/// Minimal extent of `bytes` that differs from `pattern`, or `None` if the
/// region is intact.
pub fn find_extent(bytes: &[u8], pattern: u8) -> Option<Extent> {
    let start = first_mismatch(bytes, pattern)?;
    // bytes[start] differs, so the reverse search always lands at or after it.
    let end = start + last_mismatch(&bytes[start..], pattern).unwrap_or(0);
    Some(Extent { start, end })
}

/// True if `a` and `b` differ in exactly one bit.
#[inline]
pub fn is_single_bit_flip(a: u8, b: u8) -> bool {
    (a ^ b).count_ones() == 1
}
