//! Schedule engine (service layer)
//!
//! Continuity generation, week status queries, asset registry and the
//! schedule-change event bus, all on top of a shared [`upkeep_storage::Storage`].

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod continuity;
pub mod status;
pub mod registry;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use events::{ScheduleEvent, ScheduleEvents};
pub use continuity::{AssetFailure, AssetOutcome, BatchReport, ContinuityEngine};
pub use status::{StatusService, WeekSummary};
pub use registry::AssetRegistry;
