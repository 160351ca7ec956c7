//! Push and gateway statistics
//!
//! Counters are shared by every request a process serves and read through
//! point-in-time snapshots.

pub mod push_stats;

pub use push_stats::*;
