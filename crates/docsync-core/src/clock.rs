//! Wall-clock source for default register timestamps.
//!
//! Register writes carry caller-supplied logical timestamps. The store only
//! consults a clock when a register is seeded with a bare value and has to
//! invent a timestamp for it.

use chrono::Utc;
use std::fmt::Debug;

/// A source of signed 64-bit timestamps.
pub trait Clock: Debug + Send + Sync {
    /// Current time in nanoseconds since the UNIX epoch.
    fn now_nanos(&self) -> i64;
}

/// Clock backed by the system's UTC wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        // Out of range after the year 2262.
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

/// Clock that always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_nanos(&self) -> i64 {
        self.0
    }
}
