//! Synchronization primitives.
//!
//! The context lock is a thin wrapper over std or parking_lot mutexes;
//! statistics use relaxed atomic counters.

pub(crate) mod atomics;
pub(crate) mod mutex;
