//! Compliance classification of (asset, week, year) cells.
//!
//! Classification answers "what happened" for a week and never fails: any
//! missing or inconsistent input falls back to [`WeekStatus::Pendiente`].
//! Whether a record can still be submitted for a week is a separate question,
//! answered by [`is_registrable`].

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::execution::ExecutionRecord;
use crate::schedule::DueSchedule;

/// Compliance state of one scheduled (or corrective) cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum WeekStatus {
    /// Due now or in the future, nothing recorded yet
    Pendiente,
    /// Completed within the due week
    RealizadoEnTiempo,
    /// Completed after the due week ended
    RealizadoFueraDeTiempo,
    /// Due week is over and nothing was done
    NoRealizado,
    /// Due last week and still open
    Atrasado,
    /// Work logged on a week with no scheduled visit
    Correctivo {
        /// State the asset reported, passed through untouched
        reported_state: Option<String>,
    },
}

impl WeekStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekStatus::Pendiente => "Pendiente",
            WeekStatus::RealizadoEnTiempo => "RealizadoEnTiempo",
            WeekStatus::RealizadoFueraDeTiempo => "RealizadoFueraDeTiempo",
            WeekStatus::NoRealizado => "NoRealizado",
            WeekStatus::Atrasado => "Atrasado",
            WeekStatus::Correctivo { .. } => "Correctivo",
        }
    }

    /// Whether the state can no longer change for a scheduled cell.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            WeekStatus::RealizadoEnTiempo
                | WeekStatus::RealizadoFueraDeTiempo
                | WeekStatus::NoRealizado
        )
    }
}

impl std::fmt::Display for WeekStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeekStatus::Correctivo { reported_state: Some(state) } => {
                write!(f, "Correctivo ({})", state)
            }
            other => f.write_str(other.as_str()),
        }
    }
}

/// Where a queried week sits relative to the current week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekPosition {
    /// Two or more weeks back, or an earlier ISO year
    Past,
    /// Exactly one week back in the current ISO year
    Previous,
    /// The current week
    Current,
    /// Later this year, or a later ISO year
    Future,
}

/// Position of ISO `week`/`year` relative to `today`.
///
/// Week distance only counts inside the current ISO year; any earlier year is
/// [`WeekPosition::Past`] and any later year [`WeekPosition::Future`].
pub fn week_position(week: u32, year: i32, today: NaiveDate) -> WeekPosition {
    let (current_week, current_year) = calendar::week_of_year(today);
    if year < current_year {
        return WeekPosition::Past;
    }
    if year > current_year {
        return WeekPosition::Future;
    }
    match week as i64 - current_week as i64 {
        d if d < -1 => WeekPosition::Past,
        -1 => WeekPosition::Previous,
        0 => WeekPosition::Current,
        _ => WeekPosition::Future,
    }
}

/// Classify one cell.
///
/// A record with no matching due entry is [`WeekStatus::Correctivo`]. A record
/// keyed to a different week or year than the query is ignored.
pub fn classify(
    due: Option<&DueSchedule>,
    record: Option<&ExecutionRecord>,
    week: u32,
    year: i32,
    today: NaiveDate,
) -> WeekStatus {
    let record = record.filter(|r| r.week == week && r.year == year);
    let scheduled = due
        .filter(|d| d.year == year && d.is_well_formed())
        .is_some_and(|d| d.is_due(week));

    if !scheduled {
        return match record {
            Some(r) => WeekStatus::Correctivo {
                reported_state: r.reported_state.clone(),
            },
            None => WeekStatus::Pendiente,
        };
    }

    let Some(week_start) = calendar::first_date_of_week(year, week) else {
        return WeekStatus::Pendiente;
    };
    let week_end = week_start + Duration::days(6);
    let completed_on = record.and_then(|r| r.completed_on);

    let position = week_position(week, year, today);
    if position == WeekPosition::Future {
        return WeekStatus::Pendiente;
    }

    match completed_on {
        Some(done) if done > week_end => WeekStatus::RealizadoFueraDeTiempo,
        // Early completion counts as on time.
        Some(_) => WeekStatus::RealizadoEnTiempo,
        None => match position {
            WeekPosition::Past => WeekStatus::NoRealizado,
            WeekPosition::Previous => WeekStatus::Atrasado,
            WeekPosition::Current | WeekPosition::Future => WeekStatus::Pendiente,
        },
    }
}

/// Whether an execution record may still be submitted for ISO `week`/`year`.
///
/// Open for the current week and one week either side, measured on the
/// calendar so the window spans year boundaries.
pub fn is_registrable(week: u32, year: i32, today: NaiveDate) -> bool {
    if calendar::validate_week(year, week).is_err() {
        return false;
    }
    calendar::first_date_of_week(year, week)
        .map(|monday| calendar::weeks_between(today, monday).abs() <= 1)
        .unwrap_or(false)
}
