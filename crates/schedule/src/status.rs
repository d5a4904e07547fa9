//! Week status queries.
//!
//! Read-only: schedules and execution records are fetched per query and
//! classified against the clock. Safe to run alongside a continuity batch;
//! anything it has not written yet just shows up on the next query.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use upkeep_core::{
    calendar, classify, week_position, Asset, AssetId, Clock, SystemClock, WeekPosition, WeekStatus,
};
use upkeep_storage::Storage;

use crate::error::{EngineError, Result};

/// Per-state counts for one week.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeekSummary {
    /// Scheduled cells (everything except corrective entries)
    pub scheduled: usize,
    /// Due now or later
    pub pending: usize,
    /// Completed within the week
    pub on_time: usize,
    /// Completed after the week
    pub late: usize,
    /// Never done
    pub missed: usize,
    /// Due last week, still open
    pub overdue: usize,
    /// Unscheduled corrective work
    pub corrective: usize,
    /// On-time share of settled cells (0-100), if any are settled
    pub compliance: Option<f32>,
}

impl WeekSummary {
    /// Tally classified cells.
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a WeekStatus>) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            match status {
                WeekStatus::Pendiente => summary.pending += 1,
                WeekStatus::RealizadoEnTiempo => summary.on_time += 1,
                WeekStatus::RealizadoFueraDeTiempo => summary.late += 1,
                WeekStatus::NoRealizado => summary.missed += 1,
                WeekStatus::Atrasado => summary.overdue += 1,
                WeekStatus::Correctivo { .. } => summary.corrective += 1,
            }
        }
        summary.scheduled = summary.pending + summary.on_time + summary.late + summary.missed + summary.overdue;

        let settled = summary.on_time + summary.late + summary.missed;
        summary.compliance = if settled > 0 {
            Some((summary.on_time as f32 / settled as f32) * 100.0)
        } else {
            None
        };
        summary
    }
}

/// Answers "how is the fleet doing in week N".
#[derive(Clone)]
pub struct StatusService {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl StatusService {
    /// Create a service on the system clock.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Classify every asset that is due, or has work logged, in ISO `week` of
    /// `year`. Inactive assets only appear for past and current weeks. Sorted
    /// by asset code.
    pub async fn week_status(&self, week: u32, year: i32) -> Result<Vec<(Asset, WeekStatus)>> {
        calendar::validate_week(year, week)?;
        let today = self.clock.today();

        let assets = self
            .storage
            .list_assets()
            .await
            .map_err(EngineError::storage("asset list"))?;
        let schedules: HashMap<AssetId, _> = self
            .storage
            .list_schedules(year)
            .await
            .map_err(EngineError::storage(format!("schedules {}", year)))?
            .into_iter()
            .map(|s| (s.asset_id, s))
            .collect();
        let records: HashMap<AssetId, _> = self
            .storage
            .list_executions(week, year)
            .await
            .map_err(EngineError::storage(format!("executions {}-W{:02}", year, week)))?
            .into_iter()
            .map(|r| (r.asset_id, r))
            .collect();

        // Retired assets keep their history but are not planned forward.
        let future = week_position(week, year, today) == WeekPosition::Future;
        let mut cells: Vec<(Asset, WeekStatus)> = assets
            .into_iter()
            .filter(|asset| asset.active || !future)
            .filter_map(|asset| {
                let due = schedules.get(&asset.id);
                let record = records.get(&asset.id);
                let scheduled = due.is_some_and(|d| d.is_due(week));
                if !scheduled && record.is_none() {
                    return None;
                }
                let status = classify(due, record, week, year, today);
                Some((asset, status))
            })
            .collect();

        cells.sort_by(|a, b| a.0.code.cmp(&b.0.code));
        Ok(cells)
    }

    /// Week status plus its summary.
    pub async fn week_summary(&self, week: u32, year: i32) -> Result<(Vec<(Asset, WeekStatus)>, WeekSummary)> {
        let cells = self.week_status(week, year).await?;
        let summary = WeekSummary::from_statuses(cells.iter().map(|(_, status)| status));
        Ok((cells, summary))
    }
}
