//! Source of "today"
//!
//! Predictions, overdue detection and the future-date guard all depend on the
//! current calendar day. Reading it through a trait keeps those computations
//! deterministic under test.

use crate::calendar::date::RecordedDate;
use chrono::Local;

/// Provides the current local calendar date
pub trait Clock: Send + Sync {
    fn today(&self) -> RecordedDate;
}

/// Wall clock in the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> RecordedDate {
        RecordedDate::new(Local::now().date_naive())
    }
}

/// A clock pinned to one day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub RecordedDate);

impl Clock for FixedClock {
    fn today(&self) -> RecordedDate {
        self.0
    }
}
