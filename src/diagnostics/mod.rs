//! Diagnostic output, rate limiting and fatal escalation.
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                               |
//! |-------|---------------------------------------|
//! | PP001 | Single bit error in a poisoned page   |
//! | PP002 | Wider corruption in a poisoned page   |
//! | PP101 | Single bit error log exhausted        |
//! | PP102 | Reports dropped by the rate limiter   |
//!
//! Output goes to a [`DiagnosticSink`]; fatal stops go through a
//! [`FatalHandler`].

pub mod emit;
pub mod fatal;
pub mod hexdump;
pub mod kind;
pub mod ratelimit;

pub use emit::{CollectingSink, DiagnosticSink, LogSink, SinkEvent, StderrSink};
pub use fatal::{AbortHandler, FatalHandler, FatalMode, FatalReason, FatalReport, PanicHandler};
pub use hexdump::HexDump;
pub use kind::{Diagnostic, DiagnosticKind};
pub use kind::{PP001, PP002, PP101, PP102};
pub use ratelimit::{Clock, ManualClock, MonotonicClock, RateDecision, RateLimiter};
