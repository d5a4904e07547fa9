//! ISO-8601 week calendar.
//!
//! Weeks start on Monday and week 1 is the week holding the year's first
//! Thursday. Dates at the very end of December or start of January can belong
//! to the neighbouring ISO year, so every conversion returns the ISO year
//! alongside the week number.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{DomainError, Result};

/// Number of ISO weeks in `year` (52 or 53).
///
/// December 28th always falls in the last ISO week of its year.
pub fn weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}

/// ISO `(week, iso_year)` containing `date`.
pub fn week_of_year(date: NaiveDate) -> (u32, i32) {
    let iso = date.iso_week();
    (iso.week(), iso.year())
}

/// Monday of ISO `week` in `year`.
///
/// Week numbers outside the year's range are not checked; they simply land in
/// the neighbouring year. `None` only when the year is outside chrono's range.
pub fn first_date_of_week(year: i32, week: u32) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let to_thursday = (Weekday::Thu.num_days_from_monday() as i64
        - jan1.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    let first_thursday = jan1 + Duration::days(to_thursday);
    let thursday = first_thursday + Duration::weeks(week as i64 - 1);
    Some(thursday - Duration::days(3))
}

/// Sunday closing ISO `week` in `year`.
pub fn last_date_of_week(year: i32, week: u32) -> Option<NaiveDate> {
    first_date_of_week(year, week).map(|monday| monday + Duration::days(6))
}

/// Check that `week` is a valid ISO week of `year`.
pub fn validate_week(year: i32, week: u32) -> Result<()> {
    let max = weeks_in_year(year);
    if (1..=max).contains(&week) {
        Ok(())
    } else {
        Err(DomainError::WeekOutOfRange { week, year, max })
    }
}

/// Signed number of whole weeks from the week containing `from` to the week
/// containing `to`. Works across ISO year boundaries.
pub fn weeks_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let monday = |d: NaiveDate| d - Duration::days(d.weekday().num_days_from_monday() as i64);
    (monday(to) - monday(from)).num_days() / 7
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weeks_in_year_reference_sequence() {
        let expected = [(2020, 53), (2021, 52), (2022, 52), (2023, 52), (2024, 52), (2025, 52), (2026, 53)];
        for (year, weeks) in expected {
            assert_eq!(weeks_in_year(year), weeks, "year {}", year);
        }
    }

    #[test]
    fn test_week_of_year_uses_iso_year() {
        // Friday 1 Jan 2021 still belongs to 2020-W53.
        assert_eq!(week_of_year(date(2021, 1, 1)), (53, 2020));
        // Monday 29 Dec 2025 opens 2026-W01.
        assert_eq!(week_of_year(date(2025, 12, 29)), (1, 2026));
        assert_eq!(week_of_year(date(2025, 1, 15)), (3, 2025));
    }

    #[test]
    fn test_first_date_of_week_is_monday() {
        assert_eq!(first_date_of_week(2026, 1), Some(date(2025, 12, 29)));
        assert_eq!(first_date_of_week(2025, 1), Some(date(2024, 12, 30)));
        assert_eq!(first_date_of_week(2020, 53), Some(date(2020, 12, 28)));
        assert_eq!(last_date_of_week(2025, 3), Some(date(2025, 1, 19)));
    }

    #[test]
    fn test_round_trip_all_weeks() {
        for year in 2015..=2035 {
            for week in 1..=weeks_in_year(year) {
                let monday = first_date_of_week(year, week).unwrap();
                assert_eq!(monday.weekday(), Weekday::Mon);
                assert_eq!(week_of_year(monday), (week, year));
            }
        }
    }

    #[test]
    fn test_validate_week_bounds() {
        assert!(validate_week(2025, 1).is_ok());
        assert!(validate_week(2025, 52).is_ok());
        assert_eq!(
            validate_week(2025, 53),
            Err(DomainError::WeekOutOfRange { week: 53, year: 2025, max: 52 })
        );
        assert!(validate_week(2026, 53).is_ok());
        assert!(validate_week(2026, 0).is_err());
    }

    #[test]
    fn test_weeks_between_crosses_year_boundary() {
        assert_eq!(weeks_between(date(2025, 12, 24), date(2026, 1, 2)), 1);
        assert_eq!(weeks_between(date(2026, 1, 2), date(2025, 12, 24)), -1);
        assert_eq!(weeks_between(date(2025, 3, 3), date(2025, 3, 9)), 0);
    }
}
