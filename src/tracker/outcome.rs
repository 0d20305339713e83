//! Mutation results and policy

use crate::calendar::RecordedDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How overlapping mutations are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationPolicy {
    /// One mutation (apply + confirm + resync) at a time
    #[default]
    Serialized,
    /// Mutations overlap; a resync may discard another in-flight change
    Concurrent,
}

/// Why a toggle left the set unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The date is after today
    InFuture { today: RecordedDate },
    /// An existing date lies closer than the minimum cycle length
    TooClose { conflict: RecordedDate, days: i64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InFuture { today } => write!(f, "date is after today ({})", today),
            SkipReason::TooClose { conflict, days } => {
                write!(f, "only {} days from recorded date {}", days, conflict)
            }
        }
    }
}

/// What a toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Recorded and confirmed by the source
    Added,
    /// Removed and confirmed by the source
    Removed,
    /// Guard rejected the date; nothing changed
    Skipped(SkipReason),
    /// The source refused the change; local set reloaded from it
    Resynced,
}

impl ToggleOutcome {
    /// Whether the recorded set ended up different from before the call
    /// (as far as this call alone is concerned)
    pub fn is_applied(&self) -> bool {
        matches!(self, ToggleOutcome::Added | ToggleOutcome::Removed)
    }
}

/// What a removal did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveOutcome {
    Removed,
    Resynced,
}
