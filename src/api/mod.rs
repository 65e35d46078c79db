//! Public API for pagepoison.
//!
//! This module contains the user-facing types: configuration, the
//! allocator-facing checker, and statistics.

pub mod checker;
pub mod config;
pub mod stats;
