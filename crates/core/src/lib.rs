//! Upkeep core data models and scheduling math.
//!
//! This crate holds the pure parts of preventive-maintenance scheduling:
//! the ISO week calendar, recurrence generation, cross-year continuity and
//! compliance classification. Nothing in here touches storage or the clock
//! directly.

#![warn(missing_docs)]

// Core identities
mod id;
mod error;

// Calendar and time
pub mod calendar;
mod clock;

// Records
mod asset;
mod schedule;
mod execution;

// Algorithms
pub mod recurrence;
pub mod status;

// Re-exports
pub use id::AssetId;
pub use error::{DomainError, Result};
pub use clock::{Clock, FixedClock, SystemClock};

pub use asset::{Asset, Cadence};
pub use schedule::DueSchedule;
pub use execution::ExecutionRecord;

pub use recurrence::{generate_recurrence, plan_year, horizon_year, DEFAULT_LOOKAHEAD_MONTH};
pub use status::{classify, is_registrable, week_position, WeekPosition, WeekStatus};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
