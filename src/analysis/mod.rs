//! Cycle Statistics & Prediction
//!
//! Turns a sorted set of recorded dates into everything shown to the user:
//!
//! - **types**: `CycleParams`, `Confidence`, `Prediction`, `HistoryEntry`, `CycleStats`
//! - **engine**: pure derivation functions and the `CycleAnalysis` snapshot
//!
//! # Derivation
//!
//! ```text
//! sorted dates ─┬─> gaps ─> valid gaps [15, 45] ─> average ─┐
//!               ├─> count ─> confidence ────────────────────┼─> predictions ─> days until next
//!               └─> history (raw gaps, newest first)        │                      │
//!                                                           └──> current day / progress
//! ```
//!
//! # Example
//!
//! ```rust
//! use cycletrack::analysis::{CycleAnalysis, CycleParams, Confidence};
//! use cycletrack::calendar::parse;
//!
//! let dates = vec![parse("2024-01-01").unwrap(), parse("2024-01-29").unwrap()];
//! let analysis = CycleAnalysis::compute(dates, parse("2024-02-10").unwrap(), &CycleParams::default());
//!
//! assert_eq!(analysis.average_cycle_length, Some(28));
//! assert_eq!(analysis.confidence, Some(Confidence::Low));
//! assert_eq!(analysis.predictions[0].date.to_string(), "2024-02-26");
//! ```

pub mod engine;
pub mod types;

pub use engine::{
    average_cycle_length, confidence, current_cycle_day, cycle_gaps, cycle_progress, cycle_stats,
    days_until_next, history, predictions, CycleAnalysis,
};
pub use types::{
    Confidence, CycleParams, CycleStats, HistoryEntry, Prediction, StatusReport, MAX_CYCLE_DAYS,
    MIN_CYCLE_DAYS, PREDICTION_HORIZON,
};
