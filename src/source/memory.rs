//! In-memory date source
//!
//! Holds the authoritative set in process. Used by tests and by the CLI's
//! `memory` backend. Failures can be scheduled ahead of time to exercise the
//! resynchronization path, and an artificial latency makes in-flight
//! overlaps observable.

use super::{validate_new_date, DateSource, SourceError, SourceResult};
use crate::calendar::{Clock, RecordedDate, SystemClock};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

/// Pending injected failures
#[derive(Debug, Default)]
struct FaultPlan {
    persist_failures: usize,
    delete_failures: usize,
    fail_fetches: bool,
}

/// Date source backed by an in-process set
pub struct MemorySource {
    dates: RwLock<BTreeSet<RecordedDate>>,
    clock: Arc<dyn Clock>,
    faults: Mutex<FaultPlan>,
    latency: Option<Duration>,
    fetch_count: AtomicUsize,
    persist_count: AtomicUsize,
    delete_count: AtomicUsize,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    /// Empty source using the system clock
    pub fn new() -> Self {
        Self {
            dates: RwLock::new(BTreeSet::new()),
            clock: Arc::new(SystemClock),
            faults: Mutex::new(FaultPlan::default()),
            latency: None,
            fetch_count: AtomicUsize::new(0),
            persist_count: AtomicUsize::new(0),
            delete_count: AtomicUsize::new(0),
        }
    }

    /// Builder: seed with existing dates
    pub fn with_dates(mut self, dates: impl IntoIterator<Item = RecordedDate>) -> Self {
        self.dates.get_mut().extend(dates);
        self
    }

    /// Builder: use a specific clock for the future-date rule
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `n` persist calls fail
    pub fn fail_next_persist(&self, n: usize) {
        if let Ok(mut plan) = self.faults.lock() {
            plan.persist_failures += n;
        }
    }

    /// Make the next `n` delete calls fail
    pub fn fail_next_delete(&self, n: usize) {
        if let Ok(mut plan) = self.faults.lock() {
            plan.delete_failures += n;
        }
    }

    /// Make every fetch fail until turned off
    pub fn fail_fetches(&self, fail: bool) {
        if let Ok(mut plan) = self.faults.lock() {
            plan.fail_fetches = fail;
        }
    }

    /// Authoritative contents, ascending
    pub async fn snapshot(&self) -> Vec<RecordedDate> {
        self.dates.read().await.iter().copied().collect()
    }

    /// Change the authoritative set behind the tracker's back
    pub async fn insert_direct(&self, date: RecordedDate) {
        self.dates.write().await.insert(date);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn persist_count(&self) -> usize {
        self.persist_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Consume one scheduled failure of the given kind, if any
    fn take_fault(&self, pick: impl FnOnce(&mut FaultPlan) -> bool) -> SourceResult<bool> {
        let mut plan = self
            .faults
            .lock()
            .map_err(|e| SourceError::Lock(e.to_string()))?;
        Ok(pick(&mut *plan))
    }
}

#[async_trait]
impl DateSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_all(&self) -> SourceResult<Vec<RecordedDate>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.take_fault(|plan| plan.fail_fetches)? {
            return Err(SourceError::Injected("fetch".to_string()));
        }

        Ok(self.snapshot().await)
    }

    async fn persist(&self, date: RecordedDate) -> SourceResult<()> {
        self.persist_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let injected = self.take_fault(|plan| {
            let fail = plan.persist_failures > 0;
            plan.persist_failures = plan.persist_failures.saturating_sub(1);
            fail
        })?;
        if injected {
            return Err(SourceError::Injected(format!("persist {}", date)));
        }

        validate_new_date(date, self.clock.today())?;

        let mut dates = self.dates.write().await;
        if !dates.insert(date) {
            return Err(SourceError::AlreadyRecorded(date));
        }
        Ok(())
    }

    async fn delete(&self, date: RecordedDate) -> SourceResult<()> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let injected = self.take_fault(|plan| {
            let fail = plan.delete_failures > 0;
            plan.delete_failures = plan.delete_failures.saturating_sub(1);
            fail
        })?;
        if injected {
            return Err(SourceError::Injected(format!("delete {}", date)));
        }

        self.dates.write().await.remove(&date);
        Ok(())
    }
}
