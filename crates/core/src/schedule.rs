//! Due schedule model - which ISO weeks of a year need a visit.

use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{DomainError, Result};
use crate::id::AssetId;
use crate::Time;

/// Per-asset, per-year due-week vector.
///
/// Immutable once built; a cadence change means a new year's schedule, never
/// an edit. `weeks[i]` is ISO week `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueSchedule {
    /// Owning asset
    pub asset_id: AssetId,

    /// ISO year
    pub year: i32,

    /// One flag per ISO week of `year`
    weeks: Vec<bool>,

    /// When generated
    pub created_at: Time,
}

impl DueSchedule {
    /// Build a schedule, rejecting a vector whose length is not the year's
    /// ISO week count.
    pub fn new(asset_id: AssetId, year: i32, weeks: Vec<bool>) -> Result<Self> {
        let expected = calendar::weeks_in_year(year) as usize;
        if weeks.len() != expected {
            return Err(DomainError::ScheduleLength {
                year,
                expected,
                actual: weeks.len(),
            });
        }
        Ok(Self {
            asset_id,
            year,
            weeks,
            created_at: chrono::Utc::now(),
        })
    }

    /// Raw due flags.
    pub fn weeks(&self) -> &[bool] {
        &self.weeks
    }

    /// Whether ISO `week` (1-based) is due. Out-of-range weeks are never due.
    pub fn is_due(&self, week: u32) -> bool {
        week >= 1 && self.weeks.get(week as usize - 1).copied().unwrap_or(false)
    }

    /// Highest due index (0-based), if any.
    pub fn last_due_index(&self) -> Option<usize> {
        self.weeks.iter().rposition(|&due| due)
    }

    /// Due weeks as 1-based ISO week numbers.
    pub fn due_weeks(&self) -> Vec<u32> {
        self.weeks
            .iter()
            .enumerate()
            .filter(|(_, &due)| due)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    /// Whether the stored vector still matches its year; guards deserialized
    /// data that bypassed [`DueSchedule::new`].
    pub fn is_well_formed(&self) -> bool {
        self.weeks.len() == calendar::weeks_in_year(self.year) as usize
    }
}
