//! Asset model - a tracked piece of equipment with a maintenance cadence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::DomainError;
use crate::id::AssetId;
use crate::Time;

/// An asset under preventive maintenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique identifier
    pub id: AssetId,

    /// Human-readable code, unique across the fleet
    pub code: String,

    /// Optional display name
    #[serde(default)]
    pub name: Option<String>,

    /// Date the asset was onboarded; anchors the first due week
    pub registered_on: NaiveDate,

    /// Maintenance cadence
    pub cadence: Cadence,

    /// Lifecycle flag; inactive assets get no new schedules
    pub active: bool,

    /// When created
    pub created_at: Time,
}

impl Asset {
    /// Create a new active asset.
    pub fn new(code: impl Into<String>, registered_on: NaiveDate, cadence: Cadence) -> Self {
        Self {
            id: AssetId::new(),
            code: code.into(),
            name: None,
            registered_on,
            cadence,
            active: true,
            created_at: chrono::Utc::now(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// ISO year the asset was registered in.
    pub fn registration_year(&self) -> i32 {
        calendar::week_of_year(self.registered_on).1
    }
}

/// Recurrence interval between maintenance visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Every week
    Weekly,
    /// Every two weeks
    Biweekly,
    /// Every four weeks
    Monthly,
    /// Every eight weeks
    Bimonthly,
    /// Every thirteen weeks
    Quarterly,
    /// Every twenty-six weeks
    Semiannual,
    /// Once per ISO year
    Annual,
}

impl Cadence {
    /// All cadences, shortest first.
    pub const ALL: [Cadence; 7] = [
        Cadence::Weekly,
        Cadence::Biweekly,
        Cadence::Monthly,
        Cadence::Bimonthly,
        Cadence::Quarterly,
        Cadence::Semiannual,
        Cadence::Annual,
    ];

    /// Step in weeks for `year`. Only `Annual` depends on the year.
    pub fn step(self, year: i32) -> u32 {
        match self {
            Cadence::Weekly => 1,
            Cadence::Biweekly => 2,
            Cadence::Monthly => 4,
            Cadence::Bimonthly => 8,
            Cadence::Quarterly => 13,
            Cadence::Semiannual => 26,
            Cadence::Annual => calendar::weeks_in_year(year),
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Biweekly => "biweekly",
            Cadence::Monthly => "monthly",
            Cadence::Bimonthly => "bimonthly",
            Cadence::Quarterly => "quarterly",
            Cadence::Semiannual => "semiannual",
            Cadence::Annual => "annual",
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Cadence {
    type Err = DomainError;

    /// Accepts the English names and the Spanish labels used on the shop floor.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "semanal" => Ok(Cadence::Weekly),
            "biweekly" | "quincenal" => Ok(Cadence::Biweekly),
            "monthly" | "mensual" => Ok(Cadence::Monthly),
            "bimonthly" | "bimestral" => Ok(Cadence::Bimonthly),
            "quarterly" | "trimestral" => Ok(Cadence::Quarterly),
            "semiannual" | "semestral" => Ok(Cadence::Semiannual),
            "annual" | "anual" => Ok(Cadence::Annual),
            _ => Err(DomainError::InvalidCadence(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_steps() {
        let steps: Vec<u32> = Cadence::ALL.iter().map(|c| c.step(2025)).collect();
        assert_eq!(steps, vec![1, 2, 4, 8, 13, 26, 52]);
        assert_eq!(Cadence::Annual.step(2026), 53);
    }

    #[test]
    fn test_cadence_parse() {
        assert_eq!("Monthly".parse::<Cadence>(), Ok(Cadence::Monthly));
        assert_eq!("trimestral".parse::<Cadence>(), Ok(Cadence::Quarterly));
        assert_eq!(" ANUAL ".parse::<Cadence>(), Ok(Cadence::Annual));
        assert_eq!(
            "fortnightly-ish".parse::<Cadence>(),
            Err(DomainError::InvalidCadence("fortnightly-ish".to_string()))
        );
    }

    #[test]
    fn test_cadence_display_parses_back() {
        for cadence in Cadence::ALL {
            assert_eq!(cadence.to_string().parse::<Cadence>(), Ok(cadence));
        }
    }

    #[test]
    fn test_registration_year_is_iso_year() {
        let asset = Asset::new(
            "PUMP-01",
            NaiveDate::from_ymd_opt(2021, 1, 2).unwrap(),
            Cadence::Weekly,
        );
        assert_eq!(asset.registration_year(), 2020);
        assert!(asset.active);
    }
}
