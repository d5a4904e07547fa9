//! Upkeep CLI - preventive maintenance schedules on a local data directory.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use upkeep_core::{
    calendar, generate_recurrence, Cadence, Clock, ExecutionRecord, FixedClock, SystemClock,
    WeekStatus,
};
use upkeep_schedule::{AssetRegistry, ContinuityEngine, EngineConfig, StatusService};
use upkeep_storage::Storage;

#[derive(Parser)]
#[command(name = "upkeep")]
#[command(about = "Preventive maintenance recurrence and compliance", long_about = None)]
struct Cli {
    /// Data directory
    #[arg(long, env = "UPKEEP_DATA_DIR", default_value = ".upkeep", global = true)]
    data_dir: PathBuf,

    /// Assets processed in parallel by `ensure`
    #[arg(long, env = "UPKEEP_MAX_CONCURRENT", global = true)]
    max_concurrent: Option<NonZeroUsize>,

    /// Pin "today" (YYYY-MM-DD)
    #[arg(long, env = "UPKEEP_TODAY", global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage assets
    Asset {
        #[command(subcommand)]
        command: AssetCommands,
    },
    /// Create missing schedules for every active asset
    Ensure,
    /// Print a recurrence vector without storing it
    Generate {
        /// First due week (1-based)
        start: u32,
        /// Cadence (weekly, biweekly, monthly, ...)
        cadence: Cadence,
        /// ISO year
        year: i32,
    },
    /// Log an execution for an asset
    Log {
        /// Asset code
        code: String,
        /// ISO week
        week: u32,
        /// ISO year
        year: i32,
        /// Completion date (YYYY-MM-DD)
        #[arg(long)]
        completed: Option<NaiveDate>,
        /// Reported asset state
        #[arg(long)]
        state: Option<String>,
        /// Outcome payload as JSON
        #[arg(long)]
        outcome: Option<String>,
        /// Log outside the editable window
        #[arg(long)]
        force: bool,
    },
    /// Show compliance for a week
    Status {
        /// ISO week (defaults to the current week)
        week: Option<u32>,
        /// ISO year (defaults to the current ISO year)
        year: Option<i32>,
    },
    /// Show the ISO week of a date
    Week {
        /// Date (defaults to today)
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum AssetCommands {
    /// Register a new asset
    Add {
        /// Unique asset code
        code: String,
        /// Cadence (weekly, biweekly, monthly, ...)
        #[arg(long)]
        cadence: Cadence,
        /// Registration date (defaults to today)
        #[arg(long)]
        registered: Option<NaiveDate>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// List assets
    List,
    /// Retire an asset
    Deactivate {
        /// Asset code
        code: String,
    },
    /// Bring a retired asset back
    Activate {
        /// Asset code
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    let clock: Arc<dyn Clock> = match cli.today {
        Some(date) => Arc::new(FixedClock(date)),
        None => Arc::new(SystemClock),
    };
    let today = clock.today();

    let mut config = EngineConfig::new();
    if let Some(max) = cli.max_concurrent {
        config = config.with_max_concurrent(max);
    }

    match cli.command {
        Commands::Generate { start, cadence, year } => {
            let weeks = generate_recurrence(start, Some(cadence), year);
            let due: Vec<String> = weeks
                .iter()
                .enumerate()
                .filter(|(_, due)| **due)
                .map(|(i, _)| (i + 1).to_string())
                .collect();
            println!("{} {} from W{:02}: {} of {} weeks", year, cadence, start, due.len(), weeks.len());
            println!("  {}", due.join(" "));
        }
        Commands::Week { date } => {
            let date = date.unwrap_or(today);
            let (week, year) = calendar::week_of_year(date);
            println!("{} is {}-W{:02}", date, year, week);
            if let (Some(first), Some(last)) = (
                calendar::first_date_of_week(year, week),
                calendar::last_date_of_week(year, week),
            ) {
                println!("  {} .. {} ({} weeks in {})", first, last, calendar::weeks_in_year(year), year);
            }
        }
        Commands::Asset { command } => {
            let storage = open_storage(&cli.data_dir).await?;
            let registry = AssetRegistry::new(storage).with_clock(clock);
            match command {
                AssetCommands::Add { code, cadence, registered, name } => {
                    let asset = registry
                        .register_asset(&code, registered.unwrap_or(today), cadence, name)
                        .await?;
                    println!("Added asset: {} - {} from {}", asset.code, asset.cadence, asset.registered_on);
                }
                AssetCommands::List => {
                    let assets = registry.list().await?;
                    println!("Assets ({})", assets.len());
                    for asset in assets {
                        println!(
                            "  {} | {} | {} | {}{}",
                            asset.code,
                            asset.cadence,
                            asset.registered_on,
                            if asset.active { "ACTIVE" } else { "INACTIVE" },
                            asset.name.map(|n| format!(" - {}", n)).unwrap_or_default(),
                        );
                    }
                }
                AssetCommands::Deactivate { code } => {
                    registry.set_active(&code, false).await?;
                    println!("Deactivated {}", code);
                }
                AssetCommands::Activate { code } => {
                    registry.set_active(&code, true).await?;
                    println!("Activated {}", code);
                }
            }
        }
        Commands::Ensure => {
            let engine = ContinuityEngine::new(open_storage(&cli.data_dir).await?)
                .with_clock(clock)
                .with_config(config);
            let report = engine.ensure_all().await?;

            println!("Continuity through {}", engine.horizon());
            println!("  Assets: {} active, {} inactive", report.assets, report.inactive);
            println!("  Schedules: {} created, {} existing", report.schedules_created, report.schedules_existing);
            for failure in &report.failures {
                println!("  FAILED {}: {}", failure.asset, failure.error);
            }
            if !report.failures.is_empty() {
                bail!("{} assets failed", report.failures.len());
            }
        }
        Commands::Log { code, week, year, completed, state, outcome, force } => {
            let registry = AssetRegistry::new(open_storage(&cli.data_dir).await?).with_clock(clock);
            let asset = registry.get(&code).await?;
            if !force && !registry.can_register(week, year) {
                bail!("{}-W{:02} is outside the editable window (use --force)", year, week);
            }

            let mut record = ExecutionRecord::new(asset.id, week, year)?;
            if let Some(date) = completed {
                record = record.completed(date);
            }
            if let Some(state) = state {
                record = record.with_reported_state(state);
            }
            if let Some(outcome) = outcome {
                let value = serde_json::from_str(&outcome).context("outcome is not valid JSON")?;
                record = record.with_outcome(value);
            }

            registry.record_execution(&record).await?;
            info!("Logged {} for {}-W{:02}", code, year, week);
            println!("Logged {} {}-W{:02}", code, year, week);
        }
        Commands::Status { week, year } => {
            let (current_week, current_year) = calendar::week_of_year(today);
            let week = week.unwrap_or(current_week);
            let year = year.unwrap_or(current_year);

            let service = StatusService::new(open_storage(&cli.data_dir).await?).with_clock(clock);
            let (cells, summary) = service.week_summary(week, year).await?;

            println!("Week {}-W{:02} ({} assets)", year, week, cells.len());
            for (asset, status) in &cells {
                println!("  {} | {}", asset.code, format_status(status));
            }
            println!(
                "  Pending {} | On time {} | Late {} | Missed {} | Overdue {} | Corrective {}",
                summary.pending, summary.on_time, summary.late, summary.missed, summary.overdue, summary.corrective,
            );
            match summary.compliance {
                Some(ratio) => println!("  Compliance: {:.1}%", ratio),
                None => println!("  Compliance: n/a"),
            }
        }
    }

    Ok(())
}

#[cfg(not(feature = "sqlite"))]
async fn open_storage(data_dir: &Path) -> Result<Arc<dyn Storage>> {
    let storage = upkeep_storage::JsonStorage::new(data_dir)
        .await
        .with_context(|| format!("opening {}", data_dir.display()))?;
    Ok(Arc::new(storage))
}

#[cfg(feature = "sqlite")]
async fn open_storage(data_dir: &Path) -> Result<Arc<dyn Storage>> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = data_dir.join("upkeep.db");
    let storage = upkeep_storage::SqliteStorage::new_from_path(&path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(Arc::new(storage))
}

fn format_status(status: &WeekStatus) -> String {
    match status {
        WeekStatus::Pendiente => "PENDING".to_string(),
        WeekStatus::RealizadoEnTiempo => "ON TIME".to_string(),
        WeekStatus::RealizadoFueraDeTiempo => "LATE".to_string(),
        WeekStatus::NoRealizado => "MISSED".to_string(),
        WeekStatus::Atrasado => "OVERDUE".to_string(),
        WeekStatus::Correctivo { reported_state: Some(state) } => format!("CORRECTIVE ({})", state),
        WeekStatus::Correctivo { reported_state: None } => "CORRECTIVE".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[tokio::test]
    async fn test_calendar_commands_leave_data_dir_alone() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let data = data_dir.to_str().unwrap();

        run(parse(&["upkeep", "--data-dir", data, "generate", "7", "monthly", "2025"])).await.unwrap();
        run(parse(&["upkeep", "--data-dir", data, "week", "2025-12-29"])).await.unwrap();
        assert!(!data_dir.exists());
    }

    #[tokio::test]
    async fn test_storage_commands_open_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let data = data_dir.to_str().unwrap();

        run(parse(&[
            "upkeep", "--data-dir", data, "--today", "2025-05-14",
            "asset", "add", "HVAC-1", "--cadence", "mensual",
        ]))
        .await
        .unwrap();
        run(parse(&["upkeep", "--data-dir", data, "--today", "2025-05-14", "ensure"])).await.unwrap();
        assert!(data_dir.exists());

        let err = run(parse(&[
            "upkeep", "--data-dir", data, "--today", "2025-05-14",
            "log", "HVAC-1", "10", "2025",
        ]))
        .await
        .unwrap_err();
        assert!(err.to_string().contains("editable window"));
    }

    #[test]
    fn test_format_status() {
        assert_eq!(format_status(&WeekStatus::Atrasado), "OVERDUE");
        assert_eq!(
            format_status(&WeekStatus::Correctivo { reported_state: Some("Averiado".into()) }),
            "CORRECTIVE (Averiado)"
        );
    }
}
