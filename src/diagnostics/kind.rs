//! Diagnostic kinds and core types.
//!
//! Mirrors rustc's diagnostic levels for familiar UX.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Corruption was detected.
    Error,
    /// Reporting degraded (for example, reports were dropped).
    Warning,
    /// Additional context about another diagnostic.
    Note,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note => "note",
        }
    }
}

/// A diagnostic message with code, message, and optional context.
///
/// Diagnostic codes follow the pattern:
/// - `PP0xx` - Corruption found while verifying poisoned pages
/// - `PP1xx` - Reporting and escalation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "PP001").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Add a note to this diagnostic.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (PP0xx - Corruption)
// =============================================================================

/// PP001: A single bit differs from the poison pattern.
pub const PP001: Diagnostic = Diagnostic::error(
    "PP001",
    "single bit error in poisoned page"
).with_note("one bit of one byte differs from the poison pattern, the signature of a transient memory fault")
 .with_help("repeated reports from the same physical address point at failing hardware");

/// PP002: Poisoned page was written.
pub const PP002: Diagnostic = Diagnostic::error(
    "PP002",
    "memory corruption in poisoned page"
).with_note("a free page was modified while it sat in the free pool")
 .with_help("look for use-after-free or buffer overruns in the page's previous owner");

// =============================================================================
// Predefined diagnostics (PP1xx - Reporting)
// =============================================================================

/// PP101: Incident log full.
pub const PP101: Diagnostic = Diagnostic::error(
    "PP101",
    "single bit error log exhausted"
).with_note("single bit errors are arriving too often to be transient faults")
 .with_help("run a memory test on this machine");

/// PP102: Reports dropped by the rate limiter.
pub const PP102: Diagnostic = Diagnostic::warning(
    "PP102",
    "corruption reports suppressed"
).with_note("the rate limiter dropped reports during the previous window");
