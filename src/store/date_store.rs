//! Store implementation
//!
//! Thread-safe via Tokio's async RwLock; the initial fetch is guarded by a
//! `OnceCell` so any number of concurrent consumers trigger a single load.

use crate::calendar::RecordedDate;
use crate::source::DateSource;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{watch, OnceCell, RwLock};

/// Initialization state of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No fetch attempted yet
    #[default]
    NotLoaded,
    /// A fetch is in flight
    Loading,
    /// At least one fetch has settled (successfully or not)
    Loaded,
}

#[derive(Debug, Default)]
struct StoreState {
    dates: BTreeSet<RecordedDate>,
    load_state: LoadState,
}

/// Recorded dates for the current subject
pub struct DateStore {
    source: Arc<dyn DateSource>,
    state: RwLock<StoreState>,
    initial_load: OnceCell<()>,
    revision: watch::Sender<u64>,
}

impl DateStore {
    pub fn new(source: Arc<dyn DateSource>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            source,
            state: RwLock::new(StoreState::default()),
            initial_load: OnceCell::new(),
            revision,
        }
    }

    /// The collaborator holding the authoritative set
    pub fn source(&self) -> &Arc<dyn DateSource> {
        &self.source
    }

    /// Load once per store lifetime
    ///
    /// Concurrent callers wait for the same fetch instead of starting their own.
    pub async fn ensure_loaded(&self) {
        self.initial_load
            .get_or_init(|| async {
                self.load().await;
            })
            .await;
    }

    /// Replace the local set with the authoritative one
    ///
    /// A failed fetch leaves the store empty rather than erroring. Returns the
    /// number of dates now held.
    pub async fn load(&self) -> usize {
        self.state.write().await.load_state = LoadState::Loading;

        let fetched = self.source.fetch_all().await;

        let count = {
            let mut state = self.state.write().await;
            match fetched {
                Ok(dates) => {
                    state.dates = dates.into_iter().collect();
                    tracing::debug!(
                        source = self.source.name(),
                        count = state.dates.len(),
                        "Loaded recorded dates"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        source = self.source.name(),
                        error = %e,
                        "Failed to load recorded dates, falling back to empty set"
                    );
                    state.dates.clear();
                }
            }
            state.load_state = LoadState::Loaded;
            state.dates.len()
        };

        self.bump();
        count
    }

    /// Recorded dates in ascending order, each once
    pub async fn sorted_dates(&self) -> Vec<RecordedDate> {
        self.state.read().await.dates.iter().copied().collect()
    }

    pub async fn contains(&self, date: &RecordedDate) -> bool {
        self.state.read().await.dates.contains(date)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.dates.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.dates.is_empty()
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.read().await.load_state
    }

    /// True until the first fetch settles, and again during any reload
    pub async fn is_loading(&self) -> bool {
        self.load_state().await != LoadState::Loaded
    }

    /// Current revision; changes whenever the set may have changed
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receive a notification after every change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Apply an edit to the set under the write lock
    ///
    /// The revision moves only when the number of dates changed, which is
    /// exact for single inserts and removals.
    pub(crate) async fn update<R>(&self, edit: impl FnOnce(&mut BTreeSet<RecordedDate>) -> R) -> R {
        let (result, changed) = {
            let mut state = self.state.write().await;
            let before = state.dates.len();
            let result = edit(&mut state.dates);
            (result, state.dates.len() != before)
        };

        if changed {
            self.bump();
        }
        result
    }

    #[cfg(test)]
    pub(crate) async fn insert(&self, date: RecordedDate) -> bool {
        self.update(|dates| dates.insert(date)).await
    }

    pub(crate) async fn remove(&self, date: &RecordedDate) -> bool {
        self.update(|dates| dates.remove(date)).await
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
