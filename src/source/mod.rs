//! Date Sources
//!
//! The authoritative copy of a subject's recorded dates lives outside the
//! core, behind the `DateSource` trait:
//!
//! - **memory**: in-process set with fault injection (tests, demos)
//! - **sqlite**: local SQLite table keyed by subject
//! - **http**: remote `/api/dates` endpoint
//!
//! Every source applies the same acceptance rules for new dates
//! (`validate_new_date`): canonical format, a real calendar day, not after
//! today, not already recorded. Deleting an absent date succeeds.

mod error;
mod http;
mod memory;
mod sqlite;

pub use error::{SourceError, SourceResult};
pub use http::{HttpSource, HttpSourceConfig};
pub use memory::MemorySource;
pub use sqlite::SqliteSource;

use crate::calendar::RecordedDate;
use async_trait::async_trait;

/// Access to the authoritative set of recorded dates for one subject
#[async_trait]
pub trait DateSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// All recorded dates for the current subject
    async fn fetch_all(&self) -> SourceResult<Vec<RecordedDate>>;

    /// Record a new date
    async fn persist(&self, date: RecordedDate) -> SourceResult<()>;

    /// Forget a date; succeeds if it was not recorded
    async fn delete(&self, date: RecordedDate) -> SourceResult<()>;
}

/// Acceptance rule shared by every source: no dates after `today`
pub fn validate_new_date(date: RecordedDate, today: RecordedDate) -> SourceResult<()> {
    if date > today {
        return Err(SourceError::FutureDate(date));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse;

    #[test]
    fn test_validate_new_date() {
        let today = parse("2024-06-15").unwrap();

        assert!(validate_new_date(parse("2024-06-14").unwrap(), today).is_ok());
        assert!(validate_new_date(today, today).is_ok());
        assert!(matches!(
            validate_new_date(parse("2024-06-16").unwrap(), today),
            Err(SourceError::FutureDate(_))
        ));
    }
}
