//! SQLite storage backend.
//!
//! Records are stored as JSON blobs keyed by their natural keys. The
//! `(asset_id, year)` primary key on `schedules` is what makes
//! [`Storage::insert_schedule_if_absent`] race-safe across processes.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;
use upkeep_core::{Asset, AssetId, DueSchedule, ExecutionRecord};

use super::trait_::{Result, Storage, StorageError};

fn db_err(e: sqlx::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a database file.
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create an in-memory SQLite storage for testing.
    ///
    /// A single connection, since each `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS assets (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                data TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS schedules (
                asset_id TEXT NOT NULL,
                year INTEGER NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (asset_id, year)
            )",
            "CREATE TABLE IF NOT EXISTS executions (
                asset_id TEXT NOT NULL,
                year INTEGER NOT NULL,
                week INTEGER NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (asset_id, year, week)
            )",
            "CREATE INDEX IF NOT EXISTS idx_executions_week ON executions(year, week)",
        ];
        for sql in statements {
            sqlx::query(sql).execute(&self.pool).await.map_err(db_err)?;
        }
        Ok(())
    }

    fn decode<T: serde::de::DeserializeOwned>(row: &sqlx::sqlite::SqliteRow) -> Result<T> {
        let data: String = row.try_get("data").map_err(db_err)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn decode_all<T: serde::de::DeserializeOwned>(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<T>> {
        rows.iter().map(Self::decode).collect()
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    // === Asset operations ===

    async fn save_asset(&self, asset: &Asset) -> Result<()> {
        let data = serde_json::to_string(asset)?;
        // Upsert on id only; a clash on code fails instead of replacing the other row.
        sqlx::query(
            "INSERT INTO assets (id, code, data) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET code = excluded.code, data = excluded.data",
        )
            .bind(asset.id.to_string())
            .bind(&asset.code)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn load_asset(&self, id: AssetId) -> Result<Option<Asset>> {
        let row = sqlx::query("SELECT data FROM assets WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn find_asset_by_code(&self, code: &str) -> Result<Option<Asset>> {
        let row = sqlx::query("SELECT data FROM assets WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        let rows = sqlx::query("SELECT data FROM assets ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Self::decode_all(&rows)
    }

    // === Due schedule operations ===

    async fn schedule_exists(&self, asset_id: AssetId, year: i32) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM schedules WHERE asset_id = ? AND year = ?")
            .bind(asset_id.to_string())
            .bind(year)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.is_some())
    }

    async fn insert_schedule_if_absent(&self, schedule: &DueSchedule) -> Result<bool> {
        let data = serde_json::to_string(schedule)?;
        let result = sqlx::query("INSERT OR IGNORE INTO schedules (asset_id, year, data) VALUES (?, ?, ?)")
            .bind(schedule.asset_id.to_string())
            .bind(schedule.year)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        let created = result.rows_affected() == 1;
        if created {
            debug!("Inserted schedule {} / {}", schedule.asset_id, schedule.year);
        }
        Ok(created)
    }

    async fn load_schedule(&self, asset_id: AssetId, year: i32) -> Result<Option<DueSchedule>> {
        let row = sqlx::query("SELECT data FROM schedules WHERE asset_id = ? AND year = ?")
            .bind(asset_id.to_string())
            .bind(year)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_schedules(&self, year: i32) -> Result<Vec<DueSchedule>> {
        let rows = sqlx::query("SELECT data FROM schedules WHERE year = ?")
            .bind(year)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Self::decode_all(&rows)
    }

    async fn has_schedules(&self, asset_id: AssetId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM schedules WHERE asset_id = ? LIMIT 1")
            .bind(asset_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.is_some())
    }

    // === Execution record operations ===

    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()> {
        let data = serde_json::to_string(record)?;
        sqlx::query("INSERT OR REPLACE INTO executions (asset_id, year, week, data) VALUES (?, ?, ?, ?)")
            .bind(record.asset_id.to_string())
            .bind(record.year)
            .bind(record.week as i64)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn load_execution(
        &self,
        asset_id: AssetId,
        week: u32,
        year: i32,
    ) -> Result<Option<ExecutionRecord>> {
        let row = sqlx::query("SELECT data FROM executions WHERE asset_id = ? AND year = ? AND week = ?")
            .bind(asset_id.to_string())
            .bind(year)
            .bind(week as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_executions(&self, week: u32, year: i32) -> Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query("SELECT data FROM executions WHERE year = ? AND week = ?")
            .bind(year)
            .bind(week as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Self::decode_all(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use upkeep_core::Cadence;

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let asset = Asset::new(
            "GEN-2",
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            Cadence::Quarterly,
        );

        storage.save_asset(&asset).await.unwrap();
        let loaded = storage.find_asset_by_code("GEN-2").await.unwrap().unwrap();
        assert_eq!(loaded.id, asset.id);
        assert_eq!(storage.list_assets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_does_not_replace_asset() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let registered = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut first = Asset::new("GEN-2", registered, Cadence::Quarterly);
        storage.save_asset(&first).await.unwrap();
        let schedule = DueSchedule::new(first.id, 2025, vec![false; 52]).unwrap();
        storage.insert_schedule_if_absent(&schedule).await.unwrap();

        let clash = Asset::new("GEN-2", registered, Cadence::Weekly);
        assert!(matches!(
            storage.save_asset(&clash).await,
            Err(StorageError::Database(_))
        ));
        let kept = storage.find_asset_by_code("GEN-2").await.unwrap().unwrap();
        assert_eq!(kept.id, first.id);
        assert!(storage.load_asset(clash.id).await.unwrap().is_none());

        // Saving the same id again still updates in place.
        first.active = false;
        storage.save_asset(&first).await.unwrap();
        assert!(!storage.load_asset(first.id).await.unwrap().unwrap().active);
        assert_eq!(storage.list_assets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_schedule_insert_if_absent() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let id = AssetId::new();
        let schedule = DueSchedule::new(id, 2026, vec![false; 53]).unwrap();

        assert!(storage.insert_schedule_if_absent(&schedule).await.unwrap());
        assert!(!storage.insert_schedule_if_absent(&schedule).await.unwrap());
        assert!(storage.schedule_exists(id, 2026).await.unwrap());
        assert!(storage.has_schedules(id).await.unwrap());
        assert_eq!(storage.list_schedules(2026).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execution_upsert() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let id = AssetId::new();
        let record = ExecutionRecord::new(id, 3, 2025).unwrap();
        storage.save_execution(&record).await.unwrap();
        let updated = record.clone().with_reported_state("ok");
        storage.save_execution(&updated).await.unwrap();

        let listed = storage.list_executions(3, 2025).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].reported_state.as_deref(), Some("ok"));
    }
}
