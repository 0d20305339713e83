//! CycleTracker - store, mutation engine and memoized statistics

use crate::analysis::{
    Confidence, CycleAnalysis, CycleParams, CycleStats, HistoryEntry, Prediction,
};
use crate::calendar::{Clock, RecordedDate, SystemClock};
use crate::source::{DateSource, SourceResult};
use crate::store::{DateStore, LoadState};
use crate::tracker::outcome::{MutationPolicy, RemoveOutcome, SkipReason, ToggleOutcome};
use std::sync::{Arc, Mutex};
use tokio::sync::MutexGuard;

/// Result of the guarded local edit inside a toggle
enum Decision {
    Add,
    Remove,
    Skip(SkipReason),
}

/// Memoized analysis, valid for one store revision on one day
struct CachedAnalysis {
    revision: u64,
    today: RecordedDate,
    analysis: Arc<CycleAnalysis>,
}

/// Session context for one subject's cycle data
pub struct CycleTracker {
    store: DateStore,
    clock: Arc<dyn Clock>,
    params: CycleParams,
    policy: MutationPolicy,
    /// Held for the whole of a mutation under `MutationPolicy::Serialized`
    mutation_gate: tokio::sync::Mutex<()>,
    cache: Mutex<Option<CachedAnalysis>>,
}

impl CycleTracker {
    /// Tracker with the system clock and default parameters
    pub fn new(source: Arc<dyn DateSource>) -> Self {
        Self {
            store: DateStore::new(source),
            clock: Arc::new(SystemClock),
            params: CycleParams::default(),
            policy: MutationPolicy::default(),
            mutation_gate: tokio::sync::Mutex::new(()),
            cache: Mutex::new(None),
        }
    }

    /// Builder: read "today" from `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: custom analysis parameters
    pub fn with_params(mut self, params: CycleParams) -> Self {
        self.params = params;
        self
    }

    /// Builder: how overlapping mutations behave
    pub fn with_policy(mut self, policy: MutationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &DateStore {
        &self.store
    }

    pub fn params(&self) -> &CycleParams {
        &self.params
    }

    pub fn policy(&self) -> MutationPolicy {
        self.policy
    }

    pub fn today(&self) -> RecordedDate {
        self.clock.today()
    }

    // ==================== Loading ====================

    /// First-use load; later calls return immediately
    pub async fn ensure_loaded(&self) {
        self.store.ensure_loaded().await;
    }

    /// Pull the authoritative set again
    pub async fn reload(&self) -> usize {
        self.store.load().await
    }

    pub async fn is_loading(&self) -> bool {
        self.store.is_loading().await
    }

    pub async fn load_state(&self) -> LoadState {
        self.store.load_state().await
    }

    /// Recorded dates, ascending
    pub async fn dates(&self) -> Vec<RecordedDate> {
        self.store.sorted_dates().await
    }

    pub async fn is_recorded(&self, date: RecordedDate) -> bool {
        self.store.contains(&date).await
    }

    // ==================== Mutations ====================

    /// Remove `date` if recorded, otherwise record it
    ///
    /// A new date is only recorded when it is not after today and no recorded
    /// date lies within `min_cycle_days` of it; otherwise nothing happens and
    /// the reason is reported as `ToggleOutcome::Skipped`.
    pub async fn toggle(&self, date: RecordedDate) -> ToggleOutcome {
        self.ensure_loaded().await;
        let _gate = self.acquire_gate().await;

        let today = self.clock.today();
        let min_days = self.params.min_cycle_days;

        let decision = self
            .store
            .update(|dates| {
                if dates.remove(&date) {
                    return Decision::Remove;
                }
                if date > today {
                    return Decision::Skip(SkipReason::InFuture { today });
                }
                if let Some(conflict) = dates.iter().find(|d| d.days_between(&date) < min_days) {
                    return Decision::Skip(SkipReason::TooClose {
                        conflict: *conflict,
                        days: conflict.days_between(&date),
                    });
                }
                dates.insert(date);
                Decision::Add
            })
            .await;

        match decision {
            Decision::Add => {
                let result = self.store.source().persist(date).await;
                if self.confirm(result, "persist", date).await {
                    ToggleOutcome::Added
                } else {
                    ToggleOutcome::Resynced
                }
            }
            Decision::Remove => {
                let result = self.store.source().delete(date).await;
                if self.confirm(result, "delete", date).await {
                    ToggleOutcome::Removed
                } else {
                    ToggleOutcome::Resynced
                }
            }
            Decision::Skip(reason) => {
                tracing::debug!(date = %date, reason = %reason, "Toggle skipped");
                ToggleOutcome::Skipped(reason)
            }
        }
    }

    /// Forget `date`
    ///
    /// The source is asked to delete it even when it is not recorded locally.
    pub async fn remove(&self, date: RecordedDate) -> RemoveOutcome {
        self.ensure_loaded().await;
        let _gate = self.acquire_gate().await;

        self.store.remove(&date).await;

        let result = self.store.source().delete(date).await;
        if self.confirm(result, "delete", date).await {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::Resynced
        }
    }

    async fn acquire_gate(&self) -> Option<MutexGuard<'_, ()>> {
        match self.policy {
            MutationPolicy::Serialized => Some(self.mutation_gate.lock().await),
            MutationPolicy::Concurrent => None,
        }
    }

    /// Phase three: keep the optimistic state, or discard it by reloading
    async fn confirm(&self, result: SourceResult<()>, action: &str, date: RecordedDate) -> bool {
        match result {
            Ok(()) => {
                tracing::debug!(action, date = %date, "Change confirmed");
                true
            }
            Err(e) => {
                tracing::warn!(
                    action,
                    date = %date,
                    source = self.store.source().name(),
                    error = %e,
                    "Change rejected, resynchronizing"
                );
                self.store.load().await;
                false
            }
        }
    }

    // ==================== Statistics ====================

    /// All derived values for the current set and today
    ///
    /// Recomputed only when the store revision or the calendar day changed
    /// since the last call.
    pub async fn analysis(&self) -> Arc<CycleAnalysis> {
        let today = self.clock.today();
        // Read before the dates: a concurrent change then only makes the key stale
        let revision = self.store.revision();

        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.as_ref() {
                if cached.revision == revision && cached.today == today {
                    return Arc::clone(&cached.analysis);
                }
            }
        }

        let dates = self.store.sorted_dates().await;
        let analysis = Arc::new(CycleAnalysis::compute(dates, today, &self.params));

        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(CachedAnalysis {
                revision,
                today,
                analysis: Arc::clone(&analysis),
            });
        }

        analysis
    }

    pub async fn stats(&self) -> CycleStats {
        self.analysis().await.stats()
    }

    pub async fn average_cycle_length(&self) -> Option<i64> {
        self.analysis().await.average_cycle_length
    }

    pub async fn confidence(&self) -> Option<Confidence> {
        self.analysis().await.confidence
    }

    pub async fn predictions(&self) -> Vec<Prediction> {
        self.analysis().await.predictions.clone()
    }

    pub async fn days_until_next(&self) -> Option<i64> {
        self.analysis().await.days_until_next
    }

    pub async fn current_cycle_day(&self) -> Option<i64> {
        self.analysis().await.current_cycle_day
    }

    pub async fn cycle_progress(&self) -> Option<f64> {
        self.analysis().await.cycle_progress
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.analysis().await.history.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{parse, FixedClock};
    use crate::source::MemorySource;
    use std::time::Duration;

    const TODAY: &str = "2024-06-15";

    fn d(s: &str) -> RecordedDate {
        parse(s).unwrap()
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(d(TODAY)))
    }

    fn setup(seed: &[&str]) -> (CycleTracker, Arc<MemorySource>) {
        let source = Arc::new(
            MemorySource::new()
                .with_clock(clock())
                .with_dates(seed.iter().map(|s| d(s))),
        );
        let tracker = CycleTracker::new(source.clone()).with_clock(clock());
        (tracker, source)
    }

    #[tokio::test]
    async fn test_toggle_adds_past_date() {
        let (tracker, source) = setup(&[]);

        assert_eq!(tracker.toggle(d("2024-06-01")).await, ToggleOutcome::Added);
        assert!(tracker.is_recorded(d("2024-06-01")).await);
        assert_eq!(source.snapshot().await, vec![d("2024-06-01")]);
    }

    #[tokio::test]
    async fn test_toggle_today_is_allowed() {
        let (tracker, _source) = setup(&[]);
        assert_eq!(tracker.toggle(d(TODAY)).await, ToggleOutcome::Added);
    }

    #[tokio::test]
    async fn test_toggle_future_is_noop() {
        let (tracker, source) = setup(&["2024-04-01"]);

        let outcome = tracker.toggle(d("2024-06-16")).await;
        assert_eq!(
            outcome,
            ToggleOutcome::Skipped(SkipReason::InFuture { today: d(TODAY) })
        );
        assert_eq!(tracker.dates().await, vec![d("2024-04-01")]);
        assert_eq!(source.persist_count(), 0);
    }

    #[tokio::test]
    async fn test_toggle_too_close_is_noop() {
        let (tracker, source) = setup(&["2024-05-01"]);

        // 14 days after and 14 days before
        for date in ["2024-05-15", "2024-04-17"] {
            let outcome = tracker.toggle(d(date)).await;
            assert_eq!(
                outcome,
                ToggleOutcome::Skipped(SkipReason::TooClose {
                    conflict: d("2024-05-01"),
                    days: 14,
                })
            );
        }
        assert_eq!(tracker.dates().await, vec![d("2024-05-01")]);
        assert_eq!(source.persist_count(), 0);

        // Exactly the minimum spacing is fine
        assert_eq!(tracker.toggle(d("2024-05-16")).await, ToggleOutcome::Added);
    }

    #[tokio::test]
    async fn test_toggle_twice_round_trips() {
        let (tracker, source) = setup(&["2024-04-01", "2024-04-29"]);

        assert_eq!(tracker.toggle(d("2024-04-29")).await, ToggleOutcome::Removed);
        assert_eq!(tracker.dates().await, vec![d("2024-04-01")]);
        assert_eq!(source.snapshot().await, vec![d("2024-04-01")]);

        assert_eq!(tracker.toggle(d("2024-04-29")).await, ToggleOutcome::Added);
        assert_eq!(tracker.dates().await, vec![d("2024-04-01"), d("2024-04-29")]);
        assert_eq!(source.snapshot().await, tracker.dates().await);
    }

    #[tokio::test]
    async fn test_failed_persist_resyncs() {
        let (tracker, source) = setup(&["2024-04-01"]);
        tracker.ensure_loaded().await;

        // Someone else recorded a date meanwhile
        source.insert_direct(d("2024-03-01")).await;
        source.fail_next_persist(1);

        assert_eq!(tracker.toggle(d("2024-05-01")).await, ToggleOutcome::Resynced);
        assert_eq!(tracker.dates().await, source.fetch_all().await.unwrap());
        assert!(!tracker.is_recorded(d("2024-05-01")).await);
        assert!(tracker.is_recorded(d("2024-03-01")).await);
    }

    #[tokio::test]
    async fn test_failed_delete_resyncs() {
        let (tracker, source) = setup(&["2024-04-01", "2024-05-01"]);
        source.fail_next_delete(1);

        assert_eq!(tracker.remove(d("2024-05-01")).await, RemoveOutcome::Resynced);
        assert_eq!(tracker.dates().await, source.fetch_all().await.unwrap());
        assert!(tracker.is_recorded(d("2024-05-01")).await);

        assert_eq!(tracker.remove(d("2024-05-01")).await, RemoveOutcome::Removed);
        assert_eq!(tracker.dates().await, vec![d("2024-04-01")]);
    }

    #[tokio::test]
    async fn test_toggle_failed_removal_restores_date() {
        let (tracker, source) = setup(&["2024-04-01", "2024-05-01"]);
        source.fail_next_delete(1);

        assert_eq!(tracker.toggle(d("2024-05-01")).await, ToggleOutcome::Resynced);
        assert_eq!(source.delete_count(), 1);
        assert!(tracker.is_recorded(d("2024-05-01")).await);
        assert_eq!(tracker.dates().await, vec![d("2024-04-01"), d("2024-05-01")]);

        assert_eq!(tracker.toggle(d("2024-05-01")).await, ToggleOutcome::Removed);
        assert_eq!(source.snapshot().await, vec![d("2024-04-01")]);
    }

    #[tokio::test]
    async fn test_remove_unrecorded_still_asks_source() {
        let (tracker, source) = setup(&[]);

        assert_eq!(tracker.remove(d("2024-05-01")).await, RemoveOutcome::Removed);
        assert_eq!(source.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_mutation_loads_first() {
        let (tracker, source) = setup(&["2024-06-01"]);

        // Proximity check must see the stored date even before anyone loaded
        let outcome = tracker.toggle(d("2024-06-05")).await;
        assert!(matches!(outcome, ToggleOutcome::Skipped(SkipReason::TooClose { .. })));
        assert_eq!(source.fetch_count(), 1);
        assert!(!tracker.is_loading().await);
    }

    #[tokio::test]
    async fn test_optimistic_change_visible_before_confirmation() {
        let source = Arc::new(
            MemorySource::new()
                .with_clock(clock())
                .with_latency(Duration::from_millis(100)),
        );
        let tracker = Arc::new(CycleTracker::new(source.clone()).with_clock(clock()));
        tracker.ensure_loaded().await;

        let handle = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.toggle(d("2024-06-01")).await })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(tracker.is_recorded(d("2024-06-01")).await);
        assert!(source.snapshot().await.is_empty());

        assert_eq!(handle.await.unwrap(), ToggleOutcome::Added);
        assert_eq!(source.snapshot().await, vec![d("2024-06-01")]);
    }

    #[tokio::test]
    async fn test_serialized_failure_does_not_discard_other_mutation() {
        let source = Arc::new(
            MemorySource::new()
                .with_clock(clock())
                .with_latency(Duration::from_millis(10)),
        );
        let tracker = CycleTracker::new(source.clone()).with_clock(clock());
        tracker.ensure_loaded().await;
        source.fail_next_persist(1);

        let (first, second) = tokio::join!(
            tracker.toggle(d("2024-03-01")),
            tracker.toggle(d("2024-05-01"))
        );

        assert_eq!(first, ToggleOutcome::Resynced);
        assert_eq!(second, ToggleOutcome::Added);
        assert_eq!(tracker.dates().await, vec![d("2024-05-01")]);
        assert_eq!(source.snapshot().await, vec![d("2024-05-01")]);
    }

    #[tokio::test]
    async fn test_concurrent_policy_applies_changes() {
        let (tracker, source) = setup(&[]);
        let tracker = tracker.with_policy(MutationPolicy::Concurrent);

        let (a, b) = tokio::join!(
            tracker.toggle(d("2024-03-01")),
            tracker.toggle(d("2024-05-01"))
        );

        assert_eq!(a, ToggleOutcome::Added);
        assert_eq!(b, ToggleOutcome::Added);
        assert_eq!(source.snapshot().await, tracker.dates().await);
    }

    #[tokio::test]
    async fn test_statistics_follow_mutations() {
        let (tracker, _source) = setup(&["2024-04-01"]);
        tracker.ensure_loaded().await;

        assert_eq!(tracker.average_cycle_length().await, None);
        assert!(tracker.predictions().await.is_empty());

        tracker.toggle(d("2024-04-29")).await;

        let stats = tracker.stats().await;
        assert_eq!(stats.average_cycle_length, Some(28));
        assert_eq!(stats.confidence, Some(Confidence::Low));
        assert_eq!(stats.next_period_date, Some(d("2024-05-27")));
        assert_eq!(stats.days_until_next, Some(-19));
        assert_eq!(stats.total_entries, 2);

        assert_eq!(tracker.current_cycle_day().await, Some(47));
        assert_eq!(tracker.cycle_progress().await, Some(1.0));
        assert_eq!(tracker.predictions().await.len(), 6);
        assert_eq!(tracker.history().await[0].cycle_duration, Some(28));
    }

    #[tokio::test]
    async fn test_analysis_is_memoized_per_revision() {
        let (tracker, _source) = setup(&["2024-04-01", "2024-04-29"]);
        tracker.ensure_loaded().await;

        let first = tracker.analysis().await;
        let second = tracker.analysis().await;
        assert!(Arc::ptr_eq(&first, &second));

        tracker.toggle(d("2024-05-27")).await;
        let third = tracker.analysis().await;
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.confidence, Some(Confidence::Medium));
    }
}
