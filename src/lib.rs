//! # Cycletrack
//!
//! Tracks the recorded start dates of a recurring biological event and
//! derives cycle statistics and forward predictions from that sparse,
//! irregular date series.
//!
//! ## Features
//!
//! - **Outlier-tolerant averaging**: only gaps within [15, 45] days count
//! - **Confidence tiers**: `basse` / `moyenne` / `haute` by sample size
//! - **Forward projection**: six predicted dates, days until next, overdue detection
//! - **Optimistic mutations**: local changes first, resync from the source on failure
//!
//! ## Modules
//!
//! - [`calendar`]: Calendar-day arithmetic and the `RecordedDate` type
//! - [`source`]: Where the authoritative dates live (memory, SQLite, HTTP)
//! - [`store`]: Local view of the recorded dates with one-time loading
//! - [`tracker`]: Mutation engine and memoized statistics per session
//! - [`analysis`]: Pure cycle statistics and prediction
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cycletrack::{calendar, CycleTracker, SqliteSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(SqliteSource::open("./cycles.db", "me")?);
//!     let tracker = CycleTracker::new(source);
//!
//!     tracker.toggle(calendar::parse("2024-01-01")?).await;
//!     tracker.toggle(calendar::parse("2024-01-29")?).await;
//!
//!     let stats = tracker.stats().await;
//!     println!("Average cycle: {:?} days", stats.average_cycle_length);
//!     println!("Next: {:?}", stats.next_period_date);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod calendar;
pub mod config;
pub mod source;
pub mod store;
pub mod tracker;

// Re-export top-level types for convenience
pub use analysis::{
    Confidence, CycleAnalysis, CycleParams, CycleStats, HistoryEntry, Prediction, StatusReport,
};

pub use calendar::{Clock, DateError, FixedClock, RecordedDate, SystemClock};

pub use source::{
    DateSource, HttpSource, HttpSourceConfig, MemorySource, SourceError, SourceResult,
    SqliteSource,
};

pub use store::{DateStore, LoadState};

pub use tracker::{CycleTracker, MutationPolicy, RemoveOutcome, SkipReason, ToggleOutcome};

pub use config::{Config, ConfigError, ConfigSearch, LoggingConfig, SourceConfig, SourceKind, TrackerConfig};
