//! Storage trait abstraction.

use async_trait::async_trait;
use upkeep_core::{Asset, AssetId, DueSchedule, ExecutionRecord};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database driver error
    #[error("database error: {0}")]
    Database(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Persistence for assets, due schedules and execution records.
///
/// Every method takes `&self` so a single backend can be shared between
/// concurrent workers behind an `Arc`.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Asset operations ===

    /// Save an asset (create or update).
    async fn save_asset(&self, asset: &Asset) -> Result<()>;

    /// Load an asset by ID.
    async fn load_asset(&self, id: AssetId) -> Result<Option<Asset>>;

    /// Find an asset by its code.
    async fn find_asset_by_code(&self, code: &str) -> Result<Option<Asset>>;

    /// List all assets.
    async fn list_assets(&self) -> Result<Vec<Asset>>;

    // === Due schedule operations ===

    /// Whether a schedule exists for (asset, year).
    async fn schedule_exists(&self, asset_id: AssetId, year: i32) -> Result<bool>;

    /// Store `schedule` unless one already exists for its (asset, year).
    ///
    /// Atomic: under concurrent callers exactly one insert wins. Returns
    /// `true` when this call created the schedule.
    async fn insert_schedule_if_absent(&self, schedule: &DueSchedule) -> Result<bool>;

    /// Load the schedule for (asset, year).
    async fn load_schedule(&self, asset_id: AssetId, year: i32) -> Result<Option<DueSchedule>>;

    /// All schedules for a year.
    async fn list_schedules(&self, year: i32) -> Result<Vec<DueSchedule>>;

    /// Whether any schedule exists for the asset.
    async fn has_schedules(&self, asset_id: AssetId) -> Result<bool>;

    // === Execution record operations ===

    /// Save an execution record, replacing any record with the same
    /// (asset, week, year).
    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()>;

    /// Load the record for (asset, week, year).
    async fn load_execution(
        &self,
        asset_id: AssetId,
        week: u32,
        year: i32,
    ) -> Result<Option<ExecutionRecord>>;

    /// All records logged for a week.
    async fn list_executions(&self, week: u32, year: i32) -> Result<Vec<ExecutionRecord>>;
}
