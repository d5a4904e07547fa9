//! JSON file storage implementation.
//!
//! One JSON file per record under a data directory:
//!
//! ```text
//! assets/<asset>.json
//! schedules/<year>/<asset>.json
//! executions/<year>/<week>/<asset>.json
//! ```
//!
//! Files are written to a temporary sibling first. Schedules are published
//! with a hard link, which fails if the target exists, so two writers racing
//! on the same (asset, year) cannot both succeed. Execution records are
//! published with a rename, which replaces.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use ulid::Ulid;
use upkeep_core::{Asset, AssetId, DueSchedule, ExecutionRecord};

use super::{Result, Storage};

/// File-based JSON storage backend.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the top-level directories.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("assets")).await?;
        fs::create_dir_all(root.join("schedules")).await?;
        fs::create_dir_all(root.join("executions")).await?;

        Ok(Self { root })
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn asset_path(&self, id: AssetId) -> PathBuf {
        self.root.join("assets").join(format!("{}.json", id))
    }

    fn schedule_dir(&self, year: i32) -> PathBuf {
        self.root.join("schedules").join(year.to_string())
    }

    fn schedule_path(&self, asset_id: AssetId, year: i32) -> PathBuf {
        self.schedule_dir(year).join(format!("{}.json", asset_id))
    }

    fn execution_dir(&self, week: u32, year: i32) -> PathBuf {
        self.root
            .join("executions")
            .join(year.to_string())
            .join(format!("{:02}", week))
    }

    fn execution_path(&self, asset_id: AssetId, week: u32, year: i32) -> PathBuf {
        self.execution_dir(week, year).join(format!("{}.json", asset_id))
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_asset(&self, asset: &Asset) -> Result<()> {
        let json = serde_json::to_string_pretty(asset)?;
        write_replace(&self.asset_path(asset.id), json.as_bytes()).await
    }

    async fn load_asset(&self, id: AssetId) -> Result<Option<Asset>> {
        read_json(&self.asset_path(id)).await
    }

    async fn find_asset_by_code(&self, code: &str) -> Result<Option<Asset>> {
        let assets: Vec<Asset> = list_dir(&self.root.join("assets")).await?;
        Ok(assets.into_iter().find(|a| a.code == code))
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = list_dir(&self.root.join("assets")).await?;
        assets.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(assets)
    }

    async fn schedule_exists(&self, asset_id: AssetId, year: i32) -> Result<bool> {
        Ok(fs::try_exists(self.schedule_path(asset_id, year)).await?)
    }

    async fn insert_schedule_if_absent(&self, schedule: &DueSchedule) -> Result<bool> {
        let dir = self.schedule_dir(schedule.year);
        fs::create_dir_all(&dir).await?;

        let path = self.schedule_path(schedule.asset_id, schedule.year);
        let tmp = temp_sibling(&path);
        let json = serde_json::to_string_pretty(schedule)?;
        fs::write(&tmp, json.as_bytes()).await?;

        let linked = fs::hard_link(&tmp, &path).await;
        let _ = fs::remove_file(&tmp).await;
        match linked {
            Ok(()) => {
                debug!("Inserted schedule {} / {}", schedule.asset_id, schedule.year);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_schedule(&self, asset_id: AssetId, year: i32) -> Result<Option<DueSchedule>> {
        read_json(&self.schedule_path(asset_id, year)).await
    }

    async fn list_schedules(&self, year: i32) -> Result<Vec<DueSchedule>> {
        list_dir(&self.schedule_dir(year)).await
    }

    async fn has_schedules(&self, asset_id: AssetId) -> Result<bool> {
        let mut years = fs::read_dir(self.root.join("schedules")).await?;
        let file_name = format!("{}.json", asset_id);
        while let Some(entry) = years.next_entry().await? {
            if fs::try_exists(entry.path().join(&file_name)).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()> {
        fs::create_dir_all(self.execution_dir(record.week, record.year)).await?;
        let json = serde_json::to_string_pretty(record)?;
        let path = self.execution_path(record.asset_id, record.week, record.year);
        write_replace(&path, json.as_bytes()).await
    }

    async fn load_execution(
        &self,
        asset_id: AssetId,
        week: u32,
        year: i32,
    ) -> Result<Option<ExecutionRecord>> {
        read_json(&self.execution_path(asset_id, week, year)).await
    }

    async fn list_executions(&self, week: u32, year: i32) -> Result<Vec<ExecutionRecord>> {
        list_dir(&self.execution_dir(week, year)).await
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    path.with_extension(format!("{}.tmp", Ulid::new()))
}

/// Write through a temporary file and rename over `path`.
async fn write_replace(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_sibling(path);
    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(items),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Some(item) = read_json(&entry.path()).await? {
            items.push(item);
        }
    }
    Ok(items)
}
