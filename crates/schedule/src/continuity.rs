//! Schedule continuity - keep every active asset scheduled from its
//! registration year through the horizon year.
//!
//! ```text
//! list assets → per asset: load year → plan_year → insert-if-absent → next year
//!             → one SchedulesChanged event for the whole run
//! ```

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use upkeep_core::{horizon_year, plan_year, Asset, Clock, DueSchedule, SystemClock};
use upkeep_storage::Storage;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{ScheduleEvent, ScheduleEvents};

/// What one asset's continuity pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetOutcome {
    /// Years whose schedules this pass created
    pub created: Vec<i32>,
    /// Years that already had a schedule
    pub existing: usize,
}

/// An asset whose pass failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    /// Asset code
    pub asset: String,
    /// Rendered error
    pub error: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Active assets processed (including failures)
    pub assets: usize,
    /// Inactive assets skipped
    pub inactive: usize,
    /// Assets that got at least one new schedule
    pub assets_changed: usize,
    /// Schedules created
    pub schedules_created: usize,
    /// Schedules that already existed
    pub schedules_existing: usize,
    /// Per-asset failures
    pub failures: Vec<AssetFailure>,
}

impl BatchReport {
    fn absorb(&mut self, outcome: AssetOutcome) {
        if !outcome.created.is_empty() {
            self.assets_changed += 1;
        }
        self.schedules_created += outcome.created.len();
        self.schedules_existing += outcome.existing;
    }
}

/// Generates missing due schedules, one asset at a time or in batches.
#[derive(Clone)]
pub struct ContinuityEngine {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    events: ScheduleEvents,
    config: EngineConfig,
}

impl ContinuityEngine {
    /// Create an engine on the system clock with default configuration.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            events: ScheduleEvents::new(),
            config: EngineConfig::default(),
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Publish onto an existing event bus.
    pub fn with_events(mut self, events: ScheduleEvents) -> Self {
        self.events = events;
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Event bus the engine publishes on.
    pub fn events(&self) -> &ScheduleEvents {
        &self.events
    }

    /// Last year that must be scheduled today.
    pub fn horizon(&self) -> i32 {
        horizon_year(self.clock.today(), self.config.lookahead_month)
    }

    /// Make sure `asset` has schedules from its registration year through the
    /// horizon. Safe to call repeatedly; inactive assets are left alone.
    pub async fn ensure_continuity(&self, asset: &Asset) -> Result<AssetOutcome> {
        let outcome = self.ensure_asset(asset).await?;
        if !outcome.created.is_empty() {
            self.publish_changed(1, outcome.created.len());
        }
        Ok(outcome)
    }

    /// Run continuity over every active asset.
    ///
    /// One asset failing is logged and recorded in the report; the rest of the
    /// batch still runs. Only listing the assets can fail the whole call.
    pub async fn ensure_all(&self) -> Result<BatchReport> {
        let assets = self
            .storage
            .list_assets()
            .await
            .map_err(EngineError::storage("asset list"))?;

        let mut report = BatchReport::default();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.get()));
        let mut workers = JoinSet::new();

        for asset in assets {
            if !asset.active {
                report.inactive += 1;
                continue;
            }
            let engine = self.clone();
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = engine.ensure_asset(&asset).await;
                (asset.code, result)
            });
        }

        while let Some(joined) = workers.join_next().await {
            report.assets += 1;
            match joined {
                Ok((_, Ok(outcome))) => report.absorb(outcome),
                Ok((code, Err(e))) => {
                    warn!("Continuity failed for asset {}: {}", code, e);
                    report.failures.push(AssetFailure {
                        asset: code,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    error!("Continuity worker aborted: {}", e);
                    report.failures.push(AssetFailure {
                        asset: "<unknown>".to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Continuity run: {} assets, {} schedules created, {} existing, {} failures",
            report.assets,
            report.schedules_created,
            report.schedules_existing,
            report.failures.len()
        );

        if report.schedules_created > 0 {
            self.publish_changed(report.assets_changed, report.schedules_created);
        }
        Ok(report)
    }

    async fn ensure_asset(&self, asset: &Asset) -> Result<AssetOutcome> {
        let mut outcome = AssetOutcome::default();
        if !asset.active {
            debug!("Skipping inactive asset {}", asset.code);
            return Ok(outcome);
        }

        let horizon = self.horizon();
        let mut previous: Option<DueSchedule> = None;

        for year in asset.registration_year()..=horizon {
            let existing = self
                .storage
                .load_schedule(asset.id, year)
                .await
                .map_err(EngineError::schedule(&asset.code, year))?;
            if let Some(existing) = existing {
                outcome.existing += 1;
                previous = Some(existing);
                continue;
            }

            let weeks = plan_year(asset.registered_on, asset.cadence, year, previous.as_ref());
            let schedule = DueSchedule::new(asset.id, year, weeks)?;
            let created = self
                .storage
                .insert_schedule_if_absent(&schedule)
                .await
                .map_err(EngineError::schedule(&asset.code, year))?;

            if created {
                debug!("Scheduled {} for {}: weeks {:?}", asset.code, year, schedule.due_weeks());
                outcome.created.push(year);
                previous = Some(schedule);
            } else {
                // Another run got there first; carry on from what it stored.
                outcome.existing += 1;
                previous = self
                    .storage
                    .load_schedule(asset.id, year)
                    .await
                    .map_err(EngineError::schedule(&asset.code, year))?;
            }
        }

        Ok(outcome)
    }

    fn publish_changed(&self, assets: usize, schedules: usize) {
        self.events.publish(ScheduleEvent::SchedulesChanged {
            assets,
            schedules,
            at: chrono::Utc::now(),
        });
    }
}
