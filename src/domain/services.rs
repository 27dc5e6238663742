//! Time source for the scheduling workflow.
//!
//! The aggregate never reads the clock itself: callers pass explicit
//! timestamps, and the use cases obtain them from an injected [`Clock`].

use crate::domain::types::TimestampUtc;
use chrono::Duration;
use std::sync::Mutex;

/// Clock service for timestamp generation.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimestampUtc;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampUtc {
        TimestampUtc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<TimestampUtc>,
}

impl ManualClock {
    pub fn new(start: TimestampUtc) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, at: TimestampUtc) {
        if let Ok(mut current) = self.current.lock() {
            *current = at;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut current) = self.current.lock() {
            *current = TimestampUtc(current.0 + by);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimestampUtc {
        match self.current.lock() {
            Ok(current) => *current,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
