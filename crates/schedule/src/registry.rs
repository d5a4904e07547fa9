//! Asset onboarding, lifecycle and execution logging.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use upkeep_core::{calendar, is_registrable, Asset, Cadence, Clock, DomainError, ExecutionRecord, SystemClock};
use upkeep_storage::Storage;

use crate::error::{EngineError, Result};

/// Writes assets and execution records on behalf of the surrounding
/// application, enforcing the invariants schedules depend on.
#[derive(Clone)]
pub struct AssetRegistry {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl AssetRegistry {
    /// Create a registry on the system clock.
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

    /// Onboard a new asset. Codes are unique.
    pub async fn register_asset(
        &self,
        code: &str,
        registered_on: NaiveDate,
        cadence: Cadence,
        name: Option<String>,
    ) -> Result<Asset> {
        if self.find(code).await?.is_some() {
            return Err(DomainError::DuplicateCode(code.to_string()).into());
        }

        let mut asset = Asset::new(code, registered_on, cadence);
        asset.name = name;
        self.storage
            .save_asset(&asset)
            .await
            .map_err(EngineError::storage(format!("asset {}", code)))?;

        info!("Registered asset {} ({}, from {})", asset.code, asset.cadence, asset.registered_on);
        Ok(asset)
    }

    /// Look an asset up by code.
    pub async fn find(&self, code: &str) -> Result<Option<Asset>> {
        self.storage
            .find_asset_by_code(code)
            .await
            .map_err(EngineError::storage(format!("asset {}", code)))
    }

    /// Look an asset up by code, failing when it does not exist.
    pub async fn get(&self, code: &str) -> Result<Asset> {
        self.find(code)
            .await?
            .ok_or_else(|| DomainError::UnknownAsset(code.to_string()).into())
    }

    /// All assets, sorted by code.
    pub async fn list(&self) -> Result<Vec<Asset>> {
        self.storage
            .list_assets()
            .await
            .map_err(EngineError::storage("asset list"))
    }

    /// Replace a stored asset.
    ///
    /// Cadence and registration date are locked once the asset has any
    /// schedule; the code must stay unique.
    pub async fn update_asset(&self, asset: &Asset) -> Result<()> {
        let context = format!("asset {}", asset.code);
        let current = self
            .storage
            .load_asset(asset.id)
            .await
            .map_err(EngineError::storage(context.clone()))?
            .ok_or_else(|| DomainError::UnknownAsset(asset.id.to_string()))?;

        let anchors_changed =
            current.cadence != asset.cadence || current.registered_on != asset.registered_on;
        if anchors_changed
            && self
                .storage
                .has_schedules(asset.id)
                .await
                .map_err(EngineError::storage(context.clone()))?
        {
            return Err(DomainError::ScheduleLocked(current.code).into());
        }

        if current.code != asset.code {
            if let Some(other) = self.find(&asset.code).await? {
                if other.id != asset.id {
                    return Err(DomainError::DuplicateCode(asset.code.clone()).into());
                }
            }
        }

        self.storage
            .save_asset(asset)
            .await
            .map_err(EngineError::storage(context))
    }

    /// Activate or retire an asset.
    pub async fn set_active(&self, code: &str, active: bool) -> Result<Asset> {
        let mut asset = self.get(code).await?;
        if asset.active != active {
            asset.active = active;
            self.update_asset(&asset).await?;
            info!("Asset {} is now {}", code, if active { "active" } else { "inactive" });
        }
        Ok(asset)
    }

    /// Whether a record for ISO `week`/`year` is still accepted today.
    pub fn can_register(&self, week: u32, year: i32) -> bool {
        is_registrable(week, year, self.clock.today())
    }

    /// Store an execution record, replacing any earlier one for the same
    /// (asset, week, year).
    pub async fn record_execution(&self, record: &ExecutionRecord) -> Result<()> {
        calendar::validate_week(record.year, record.week)?;
        let context = format!("asset {} {}-W{:02}", record.asset_id, record.year, record.week);
        let known = self
            .storage
            .load_asset(record.asset_id)
            .await
            .map_err(EngineError::storage(context.clone()))?;
        if known.is_none() {
            return Err(DomainError::UnknownAsset(record.asset_id.to_string()).into());
        }

        self.storage
            .save_execution(record)
            .await
            .map_err(EngineError::storage(context))
    }
}
