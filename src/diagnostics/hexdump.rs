//! Hex dump formatting for corrupted extents.
//!
//! Rows of 16 bytes, each prefixed with its address and followed by an
//! ASCII rendering (non-printable bytes shown as `.`).

use std::fmt;

/// Bytes per row.
pub const ROW_SIZE: usize = 16;

/// Displays `bytes` as a hex dump labelled with addresses starting at `addr`.
pub struct HexDump<'a> {
    addr: usize,
    bytes: &'a [u8],
}

impl<'a> HexDump<'a> {
    /// Create a dump of `bytes` located at `addr`.
    pub fn new(addr: usize, bytes: &'a [u8]) -> Self {
        Self { addr, bytes }
    }

    /// One formatted line per row.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.bytes
            .chunks(ROW_SIZE)
            .enumerate()
            .map(move |(row, chunk)| format_row(self.addr + row * ROW_SIZE, chunk))
    }
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn format_row(addr: usize, chunk: &[u8]) -> String {
    let hex = chunk
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ");
    let ascii: String = chunk
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect();

    format!("{:016x}: {:<width$}  {}", addr, hex, ascii, width = ROW_SIZE * 3 - 1)
}
