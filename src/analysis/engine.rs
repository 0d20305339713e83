//! Cycle statistics and forward projection
//!
//! Every function here is pure and takes the recorded dates in ascending
//! order. `CycleAnalysis` bundles all derived values for one
//! `(dates, today)` pair so callers can compute once and read many times.

use crate::analysis::types::{
    Confidence, CycleParams, CycleStats, HistoryEntry, Prediction, StatusReport,
};
use crate::calendar::RecordedDate;
use serde::Serialize;

/// Gaps between chronologically adjacent dates, keeping only valid ones
///
/// Outliers (a forgotten entry, a near-duplicate) are dropped from the
/// sequence; the dates themselves are untouched.
pub fn cycle_gaps(dates: &[RecordedDate], params: &CycleParams) -> Vec<i64> {
    dates
        .windows(2)
        .map(|pair| pair[0].days_between(&pair[1]))
        .filter(|gap| params.is_valid_gap(*gap))
        .collect()
}

/// Mean of the valid gaps, rounded to the nearest day
pub fn average_cycle_length(gaps: &[i64]) -> Option<i64> {
    if gaps.is_empty() {
        return None;
    }

    let sum: i64 = gaps.iter().sum();
    Some((sum as f64 / gaps.len() as f64).round() as i64)
}

/// Confidence tier from the raw number of recorded dates
pub fn confidence(dates: &[RecordedDate]) -> Option<Confidence> {
    Confidence::from_count(dates.len())
}

/// Fixed-horizon linear projection from the last recorded date
///
/// Empty when there is no average or fewer than two dates.
pub fn predictions(
    dates: &[RecordedDate],
    average: Option<i64>,
    params: &CycleParams,
) -> Vec<Prediction> {
    let (Some(average), Some(last), Some(confidence)) =
        (average, dates.last(), confidence(dates))
    else {
        return Vec::new();
    };

    (1..=params.prediction_horizon as i64)
        .map(|k| Prediction {
            date: last.add_days(average * k),
            confidence,
        })
        .collect()
}

/// Signed days from today to the first prediction; negative when overdue
pub fn days_until_next(predictions: &[Prediction], today: RecordedDate) -> Option<i64> {
    predictions.first().map(|next| today.days_until(&next.date))
}

/// Elapsed days into the current cycle; exceeds the average when overdue
pub fn current_cycle_day(average: Option<i64>, days_until_next: Option<i64>) -> Option<i64> {
    Some(average? - days_until_next?)
}

/// Fraction of the current cycle elapsed, clamped to `[0, 1]`
pub fn cycle_progress(average: Option<i64>, days_until_next: Option<i64>) -> Option<f64> {
    let average = average?;
    let days = days_until_next?;
    if average <= 0 {
        return None;
    }

    let elapsed = (average - days) as f64;
    Some((elapsed / average as f64).clamp(0.0, 1.0))
}

/// One entry per recorded date with its raw gap, newest first
pub fn history(dates: &[RecordedDate]) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = dates
        .iter()
        .enumerate()
        .map(|(i, date)| HistoryEntry {
            date: *date,
            cycle_duration: i.checked_sub(1).map(|prev| dates[prev].days_between(date)),
        })
        .collect();

    entries.reverse();
    entries
}

/// Every derived value for one set of recorded dates and one "today"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleAnalysis {
    pub today: RecordedDate,
    /// Recorded dates, ascending and distinct
    pub dates: Vec<RecordedDate>,
    pub gaps: Vec<i64>,
    pub average_cycle_length: Option<i64>,
    pub confidence: Option<Confidence>,
    pub predictions: Vec<Prediction>,
    pub days_until_next: Option<i64>,
    pub current_cycle_day: Option<i64>,
    pub cycle_progress: Option<f64>,
    pub history: Vec<HistoryEntry>,
}

impl CycleAnalysis {
    /// Derive everything from an arbitrary collection of dates
    ///
    /// Input order and duplicates do not matter.
    pub fn compute(
        dates: impl IntoIterator<Item = RecordedDate>,
        today: RecordedDate,
        params: &CycleParams,
    ) -> Self {
        let mut dates: Vec<RecordedDate> = dates.into_iter().collect();
        dates.sort();
        dates.dedup();

        let gaps = cycle_gaps(&dates, params);
        let average = average_cycle_length(&gaps);
        let predictions = predictions(&dates, average, params);
        let days_until = days_until_next(&predictions, today);

        Self {
            today,
            gaps,
            average_cycle_length: average,
            confidence: confidence(&dates),
            days_until_next: days_until,
            current_cycle_day: current_cycle_day(average, days_until),
            cycle_progress: cycle_progress(average, days_until),
            history: history(&dates),
            predictions,
            dates,
        }
    }

    /// Next predicted date, if any
    pub fn next_date(&self) -> Option<RecordedDate> {
        self.predictions.first().map(|p| p.date)
    }

    /// Whether the next predicted date is already behind us
    pub fn is_overdue(&self) -> bool {
        self.days_until_next.map(|d| d < 0).unwrap_or(false)
    }

    /// Summary snapshot
    pub fn stats(&self) -> CycleStats {
        CycleStats {
            average_cycle_length: self.average_cycle_length,
            next_period_date: self.next_date(),
            days_until_next: self.days_until_next,
            confidence: self.confidence,
            total_entries: self.dates.len(),
        }
    }

    /// Everything the status view shows
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            today: self.today,
            stats: self.stats(),
            current_cycle_day: self.current_cycle_day,
            cycle_progress: self.cycle_progress,
        }
    }
}

/// Summary statistics straight from sorted dates
pub fn cycle_stats(dates: &[RecordedDate], today: RecordedDate, params: &CycleParams) -> CycleStats {
    CycleAnalysis::compute(dates.iter().copied(), today, params).stats()
}
