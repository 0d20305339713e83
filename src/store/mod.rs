//! Recorded-Date Store
//!
//! Local view of one subject's recorded dates, loaded from a `DateSource`.
//! The set is the single source of truth for every statistic; each change
//! bumps a revision number that dependents watch to know when their cached
//! values are stale.
//!
//! ```text
//!            ensure_loaded() (once)        insert / remove (optimistic)
//! NotLoaded ───────────────> Loading ──> Loaded <──────────────────────┐
//!                              ^            │                          │
//!                              └── load() ──┘ (resync after failure)   │
//!                                                       CycleTracker ──┘
//! ```

mod date_store;

pub use date_store::{DateStore, LoadState};
