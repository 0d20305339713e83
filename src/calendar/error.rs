//! Date parsing errors

use thiserror::Error;

/// Errors produced when turning boundary input into a calendar date
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Input does not follow the `YYYY-MM-DD` pattern
    #[error("Invalid date format (expected YYYY-MM-DD): {0}")]
    Format(String),

    /// Pattern matches but the day does not exist (e.g. 2023-02-30)
    #[error("Invalid calendar date: {0}")]
    Invalid(String),
}

/// Result type alias for date parsing
pub type DateResult<T> = Result<T, DateError>;
