//! Diagnostic emission backends.
//!
//! Sinks are write-only and fire-and-forget: the checker never learns
//! whether output succeeded.

use std::io::Write;

use super::hexdump::HexDump;
use super::kind::{Diagnostic, DiagnosticKind};
use crate::sync::mutex::Mutex;

/// Destination for diagnostic output.
pub trait DiagnosticSink: Send + Sync {
    /// Emit a diagnostic with a runtime detail line (addresses, counts).
    fn emit(&self, diag: &Diagnostic, detail: &str);

    /// Emit a hex dump of `bytes` located at virtual address `addr`.
    fn emit_hex_dump(&self, addr: usize, bytes: &[u8]);
}

/// Writes rustc-style diagnostics to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink {
    verbose: bool,
}

impl StderrSink {
    /// Create a new stderr sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: include note and help lines.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl DiagnosticSink for StderrSink {
    fn emit(&self, diag: &Diagnostic, detail: &str) {
        let mut stderr = std::io::stderr().lock();

        let _ = writeln!(
            stderr,
            "[pagepoison][{}] {}: {}",
            diag.code,
            diag.kind.prefix(),
            diag.message
        );
        if !detail.is_empty() {
            let _ = writeln!(stderr, "  {}", detail);
        }

        if self.verbose {
            if let Some(note) = diag.note {
                let _ = writeln!(stderr, "  note: {}", note);
            }
            if let Some(help) = diag.help {
                let _ = writeln!(stderr, "  help: {}", help);
            }
        }
    }

    fn emit_hex_dump(&self, addr: usize, bytes: &[u8]) {
        let mut stderr = std::io::stderr().lock();
        for line in HexDump::new(addr, bytes).lines() {
            let _ = writeln!(stderr, "{}", line);
        }
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, diag: &Diagnostic, detail: &str) {
        match diag.kind {
            DiagnosticKind::Error => {
                log::error!("[{}] {}: {}", diag.code, diag.message, detail);
            }
            DiagnosticKind::Warning => {
                log::warn!("[{}] {}: {}", diag.code, diag.message, detail);
            }
            DiagnosticKind::Note => {
                log::info!("[{}] {}: {}", diag.code, diag.message, detail);
            }
        }

        if let Some(note) = diag.note {
            log::debug!("  note: {}", note);
        }
        if let Some(help) = diag.help {
            log::debug!("  help: {}", help);
        }
    }

    fn emit_hex_dump(&self, addr: usize, bytes: &[u8]) {
        for line in HexDump::new(addr, bytes).lines() {
            log::error!("{}", line);
        }
    }
}

/// Something a [`CollectingSink`] received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A diagnostic line.
    Diagnostic {
        /// Diagnostic code.
        code: &'static str,
        /// Severity.
        kind: DiagnosticKind,
        /// Runtime detail.
        detail: String,
    },
    /// A hex dump.
    HexDump {
        /// Address of the first byte.
        addr: usize,
        /// Dumped bytes.
        bytes: Vec<u8>,
    },
}

/// A sink that keeps everything in memory.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl CollectingSink {
    /// Create a new collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All collected events, in arrival order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// Codes of the collected diagnostics, in arrival order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Diagnostic { code, .. } => Some(*code),
                SinkEvent::HexDump { .. } => None,
            })
            .collect()
    }

    /// Whether nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diag: &Diagnostic, detail: &str) {
        self.events.lock().push(SinkEvent::Diagnostic {
            code: diag.code,
            kind: diag.kind,
            detail: detail.to_string(),
        });
    }

    fn emit_hex_dump(&self, addr: usize, bytes: &[u8]) {
        self.events.lock().push(SinkEvent::HexDump {
            addr,
            bytes: bytes.to_vec(),
        });
    }
}
