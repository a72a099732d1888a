//! Time source for elapsed-time reporting.
//!
//! Tests never depend on real time directly: the lifecycle reads the clock
//! injected into each test, which is a [`SystemClock`] unless a
//! [`ManualClock`] was put in place to make reports reproducible.

use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::time::{Duration, Instant};

pub trait Clock {
    /// Point in time used to measure elapsed durations.
    fn now(&self) -> Instant;

    /// Wall-clock time written into reports.
    fn timestamp(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// ```rust
/// use std::time::Duration;
/// use trellis::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(clock.now() - start, Duration::from_millis(250));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Cell<Duration>,
    timestamp: DateTime<Utc>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
            timestamp: DateTime::UNIX_EPOCH,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp + chrono::Duration::from_std(self.elapsed.get()).unwrap_or(chrono::Duration::zero())
    }
}
