//! Cycle Tracker
//!
//! The session context tying everything together: a `DateStore`, the clock,
//! analysis parameters and the mutation engine.
//!
//! Mutations follow a three-phase protocol:
//!
//! ```text
//! 1. apply locally   (optimistic; visible to readers immediately)
//! 2. confirm remotely (persist / delete on the DateSource)
//! 3. on failure      reload the authoritative set (no point rollback)
//! ```
//!
//! With `MutationPolicy::Serialized` (default) whole mutations run one at a
//! time, so a reload triggered by one failure never discards another
//! mutation's unconfirmed change. `MutationPolicy::Concurrent` lets them
//! overlap and accepts that race.

mod outcome;
mod session;

pub use outcome::{MutationPolicy, RemoveOutcome, SkipReason, ToggleOutcome};
pub use session::CycleTracker;
