//! Date source error types
//!
//! The core never inspects these beyond "it failed"; they exist so that
//! sources, the CLI and logs can say what went wrong.

use crate::calendar::{DateError, RecordedDate};
use thiserror::Error;

/// Errors that can occur while talking to a date source
#[derive(Error, Debug)]
pub enum SourceError {
    /// Boundary input is not a canonical, real calendar date
    #[error("Invalid date: {0}")]
    InvalidDate(#[from] DateError),

    /// Dates after today cannot be recorded
    #[error("Date in the future not allowed: {0}")]
    FutureDate(RecordedDate),

    /// The subject already has this date
    #[error("Date already recorded: {0}")]
    AlreadyRecorded(RecordedDate),

    /// Credentials missing or rejected
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Remote API answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Source unavailable")]
    Unavailable,

    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),

    /// Failure scheduled through `MemorySource` fault injection
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl SourceError {
    /// Map a reqwest error the same way for every request
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Unavailable
        } else {
            SourceError::Request(err)
        }
    }
}

/// Result type alias for source operations
pub type SourceResult<T> = Result<T, SourceError>;
