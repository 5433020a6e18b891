//! Timestamp sources for layer modification ordering

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Microseconds since the clock's epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

/// Source of modification timestamps
pub trait Clock: Send {
    fn now(&mut self) -> Timestamp;
}

/// Wall-independent clock that never repeats a value.
///
/// Two reads within the same microsecond still yield strictly increasing
/// timestamps.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
    last: Option<u64>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last: None,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&mut self) -> Timestamp {
        let elapsed = self.epoch.elapsed().as_micros() as u64;
        let value = match self.last {
            Some(last) if elapsed <= last => last.saturating_add(1),
            _ => elapsed,
        };
        self.last = Some(value);
        Timestamp(value)
    }
}

/// Hand-driven clock for tests: returns whatever it was last set to
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    current: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            current: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, value: u64) {
        self.current.store(value, Ordering::SeqCst);
    }

    pub fn advance(&self, by: u64) {
        self.current.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> Timestamp {
        Timestamp(self.current.load(Ordering::SeqCst))
    }
}
