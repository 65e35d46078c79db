//! Poisoning, verification and incident recording.

pub(crate) mod context;
pub(crate) mod pattern;
pub(crate) mod poisoner;
pub(crate) mod recorder;
pub(crate) mod scanner;
