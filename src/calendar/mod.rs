//! Calendar-day arithmetic
//!
//! Everything the cycle engine knows about time lives here:
//!
//! - **date**: `RecordedDate` and the canonical `YYYY-MM-DD` helpers
//! - **clock**: where "today" comes from
//! - **error**: parse errors
//!
//! All arithmetic works on whole calendar days. There is no time-of-day
//! component anywhere, so daylight-saving transitions cannot shift a result.

pub mod clock;
pub mod date;
pub mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use date::{add_days, days_between, format, parse, today, RecordedDate};
pub use error::{DateError, DateResult};
