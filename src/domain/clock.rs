//! Sources of "now"
//!
//! Date resolution and task creation take their anchor from a [`Clock`]
//! so tests can pin time.

use chrono::{DateTime, FixedOffset, Local};

/// Provides the current instant in the user's offset
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
