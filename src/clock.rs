//! Time source for `indexed_at` stamps.

use std::time::SystemTime;

/// Supplies the current time to the index.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock frozen at one instant, for deterministic stamps.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}
