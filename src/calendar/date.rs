//! Recorded dates and canonical date strings
//!
//! A `RecordedDate` is a calendar day with no time component. Its canonical
//! text form is `YYYY-MM-DD` (zero-padded), which is also the wire format and
//! the ordering key: for four-digit years lexical order and chronological
//! order coincide.

use crate::calendar::clock::{Clock, SystemClock};
use crate::calendar::error::{DateError, DateResult};
use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only; `\d` would also match other Unicode digits
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"))
}

/// A calendar day on which the tracked event was recorded as starting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordedDate(NaiveDate);

impl RecordedDate {
    /// Wrap an existing calendar date
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year, 1-based month and day; `None` if the day does not exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Underlying chrono date
    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// The date `days` calendar days later (earlier when negative)
    ///
    /// Saturates at the limits of the supported calendar instead of panicking.
    pub fn add_days(&self, days: i64) -> Self {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };

        Self(shifted.unwrap_or(if days >= 0 {
            NaiveDate::MAX
        } else {
            NaiveDate::MIN
        }))
    }

    /// Signed number of days from `self` to `other` (negative if `other` is earlier)
    pub fn days_until(&self, other: &RecordedDate) -> i64 {
        other.0.signed_duration_since(self.0).num_days()
    }

    /// Absolute whole-day distance to `other`
    pub fn days_between(&self, other: &RecordedDate) -> i64 {
        self.days_until(other).abs()
    }
}

impl From<NaiveDate> for RecordedDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<RecordedDate> for NaiveDate {
    fn from(date: RecordedDate) -> Self {
        date.0
    }
}

impl fmt::Display for RecordedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), self.0.month(), self.0.day())
    }
}

impl FromStr for RecordedDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl TryFrom<String> for RecordedDate {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse(&value)
    }
}

impl From<RecordedDate> for String {
    fn from(date: RecordedDate) -> Self {
        date.to_string()
    }
}

/// Parse a canonical `YYYY-MM-DD` string
///
/// Rejects anything that is not exactly four, two and two ASCII digits, and
/// patterns that name a day that does not exist.
pub fn parse(s: &str) -> DateResult<RecordedDate> {
    if !date_pattern().is_match(s) {
        return Err(DateError::Format(s.to_string()));
    }

    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(RecordedDate)
        .map_err(|_| DateError::Invalid(s.to_string()))
}

/// Render a date as `YYYY-MM-DD`
pub fn format(date: RecordedDate) -> String {
    date.to_string()
}

/// Current local calendar date
pub fn today() -> RecordedDate {
    SystemClock.today()
}

/// Absolute whole-day distance between two dates
pub fn days_between(a: RecordedDate, b: RecordedDate) -> i64 {
    a.days_between(&b)
}

/// The date `n` days after `date` (`n` may be negative)
pub fn add_days(date: RecordedDate, n: i64) -> RecordedDate {
    date.add_days(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> RecordedDate {
        parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_format() {
        let date = d("2024-03-07");
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 3);
        assert_eq!(date.day(), 7);
        assert_eq!(format(date), "2024-03-07");
    }

    #[test]
    fn test_parse_rejects_bad_format() {
        assert!(matches!(parse("2024-3-7"), Err(DateError::Format(_))));
        assert!(matches!(parse("2024/03/07"), Err(DateError::Format(_))));
        assert!(matches!(parse("2024-03-07T00:00"), Err(DateError::Format(_))));
        assert!(matches!(parse(""), Err(DateError::Format(_))));
        assert!(matches!(parse("２０２４-03-07"), Err(DateError::Format(_))));
    }

    #[test]
    fn test_parse_rejects_nonexistent_day() {
        assert!(matches!(parse("2023-02-29"), Err(DateError::Invalid(_))));
        assert!(matches!(parse("2024-13-01"), Err(DateError::Invalid(_))));
        assert!(parse("2024-02-29").is_ok());
    }

    #[test]
    fn test_format_zero_pads() {
        let date = RecordedDate::from_ymd(987, 1, 2).unwrap();
        assert_eq!(date.to_string(), "0987-01-02");
    }

    #[test]
    fn test_days_between_is_absolute() {
        assert_eq!(days_between(d("2024-01-01"), d("2024-01-29")), 28);
        assert_eq!(days_between(d("2024-01-29"), d("2024-01-01")), 28);
        assert_eq!(days_between(d("2024-01-01"), d("2024-01-01")), 0);
        // Across a DST change (Europe, last Sunday of March)
        assert_eq!(days_between(d("2024-03-30"), d("2024-04-01")), 2);
    }

    #[test]
    fn test_add_days() {
        assert_eq!(add_days(d("2024-01-29"), 28), d("2024-02-26"));
        assert_eq!(add_days(d("2024-02-26"), 28), d("2024-03-25"));
        assert_eq!(add_days(d("2024-03-01"), -1), d("2024-02-29"));
        assert_eq!(add_days(d("2023-12-31"), 1), d("2024-01-01"));
    }

    #[test]
    fn test_add_days_round_trip() {
        let start = d("2023-11-15");
        for end in ["2023-11-15", "2023-12-03", "2024-02-29", "2025-07-01"] {
            let end = d(end);
            assert_eq!(add_days(start, days_between(start, end)), end);
        }
    }

    #[test]
    fn test_ordering_matches_string_ordering() {
        let mut dates = vec![d("2024-10-01"), d("2023-12-31"), d("2024-02-09")];
        let mut strings: Vec<String> = dates.iter().map(|x| x.to_string()).collect();
        dates.sort();
        strings.sort();
        let rendered: Vec<String> = dates.iter().map(|x| x.to_string()).collect();
        assert_eq!(rendered, strings);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let date = d("2024-01-05");
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2024-01-05\"");

        let restored: RecordedDate = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, date);

        assert!(serde_json::from_str::<RecordedDate>("\"2024-1-5\"").is_err());
    }
}
