//! Execution record model - evidence of a maintenance visit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::Result;
use crate::id::AssetId;
use crate::Time;

/// What was logged for one (asset, week, year).
///
/// At most one record exists per key; logging again replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Asset the work was done on
    pub asset_id: AssetId,

    /// ISO week
    pub week: u32,

    /// ISO year
    pub year: i32,

    /// Date the visit was completed, if it was
    pub completed_on: Option<NaiveDate>,

    /// Free-form outcome payload (checklists, readings, notes)
    #[serde(default)]
    pub outcome: serde_json::Value,

    /// State reported for the asset, used for corrective work
    #[serde(default)]
    pub reported_state: Option<String>,

    /// When logged
    pub logged_at: Time,
}

impl ExecutionRecord {
    /// Create a record after checking the week belongs to `year`.
    pub fn new(asset_id: AssetId, week: u32, year: i32) -> Result<Self> {
        calendar::validate_week(year, week)?;
        Ok(Self {
            asset_id,
            week,
            year,
            completed_on: None,
            outcome: serde_json::Value::Null,
            reported_state: None,
            logged_at: chrono::Utc::now(),
        })
    }

    /// Mark completed on `date`.
    pub fn completed(mut self, date: NaiveDate) -> Self {
        self.completed_on = Some(date);
        self
    }

    /// Attach an outcome payload.
    pub fn with_outcome(mut self, outcome: serde_json::Value) -> Self {
        self.outcome = outcome;
        self
    }

    /// Attach the asset's reported state.
    pub fn with_reported_state(mut self, state: impl Into<String>) -> Self {
        self.reported_state = Some(state.into());
        self
    }
}
