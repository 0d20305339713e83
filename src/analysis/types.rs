//! Types produced by the statistics engine
//!
//! - `CycleParams`: gap filtering bounds and prediction horizon
//! - `Confidence`: sample-size tier attached to predictions
//! - `Prediction`, `HistoryEntry`, `CycleStats`: derived, never persisted

use crate::calendar::RecordedDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest gap (in days) counted as a real cycle
pub const MIN_CYCLE_DAYS: i64 = 15;
/// Longest gap (in days) counted as a real cycle
pub const MAX_CYCLE_DAYS: i64 = 45;
/// Number of future dates projected
pub const PREDICTION_HORIZON: usize = 6;

/// Tuning knobs for cycle analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleParams {
    /// Gaps shorter than this are outliers; also the minimum spacing between recorded dates
    #[serde(default = "default_min_cycle_days")]
    pub min_cycle_days: i64,
    /// Gaps longer than this are outliers (typically a missed entry)
    #[serde(default = "default_max_cycle_days")]
    pub max_cycle_days: i64,
    /// How many cycles ahead to project
    #[serde(default = "default_prediction_horizon")]
    pub prediction_horizon: usize,
}

fn default_min_cycle_days() -> i64 {
    MIN_CYCLE_DAYS
}

fn default_max_cycle_days() -> i64 {
    MAX_CYCLE_DAYS
}

fn default_prediction_horizon() -> usize {
    PREDICTION_HORIZON
}

impl Default for CycleParams {
    fn default() -> Self {
        Self {
            min_cycle_days: MIN_CYCLE_DAYS,
            max_cycle_days: MAX_CYCLE_DAYS,
            prediction_horizon: PREDICTION_HORIZON,
        }
    }
}

impl CycleParams {
    /// Whether a gap falls inside the valid range (both ends inclusive)
    pub fn is_valid_gap(&self, gap: i64) -> bool {
        gap >= self.min_cycle_days && gap <= self.max_cycle_days
    }
}

/// How much recorded history backs a prediction
///
/// Depends only on the number of recorded dates, never on gap variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    /// Exactly two recorded dates
    #[serde(rename = "basse")]
    Low,
    /// Exactly three recorded dates
    #[serde(rename = "moyenne")]
    Medium,
    /// Four or more recorded dates
    #[serde(rename = "haute")]
    High,
}

impl Confidence {
    /// Tier for a given number of recorded dates; `None` below two
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            0 | 1 => None,
            2 => Some(Confidence::Low),
            3 => Some(Confidence::Medium),
            _ => Some(Confidence::High),
        }
    }

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "basse",
            Confidence::Medium => "moyenne",
            Confidence::High => "haute",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A projected start date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: RecordedDate,
    pub confidence: Confidence,
}

/// One recorded date with the gap to its chronological predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: RecordedDate,
    /// Raw gap in days (unfiltered); `None` for the earliest date
    pub cycle_duration: Option<i64>,
}

/// Read-only summary for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    pub average_cycle_length: Option<i64>,
    pub next_period_date: Option<RecordedDate>,
    pub days_until_next: Option<i64>,
    pub confidence: Option<Confidence>,
    pub total_entries: usize,
}

/// Summary plus where today falls in the current cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub today: RecordedDate,
    #[serde(flatten)]
    pub stats: CycleStats,
    pub current_cycle_day: Option<i64>,
    pub cycle_progress: Option<f64>,
}
