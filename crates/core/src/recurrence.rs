//! Recurrence generation and cross-year continuity math.
//!
//! Everything here is pure: no storage, no clock. The schedule engine feeds
//! it the previous year's schedule and persists what comes out.

use chrono::{Datelike, NaiveDate};

use crate::asset::Cadence;
use crate::calendar;
use crate::schedule::DueSchedule;

/// Month (1-12) from which the following year is also scheduled.
pub const DEFAULT_LOOKAHEAD_MONTH: u32 = 10;

/// Due-week vector for `year`, starting at `start_week` and repeating every
/// `cadence` step.
///
/// Returns an all-false vector when the cadence is missing or the start week
/// is outside the year. Never wraps past the end of the year.
pub fn generate_recurrence(start_week: u32, cadence: Option<Cadence>, year: i32) -> Vec<bool> {
    let step = cadence.map(|c| c.step(year)).unwrap_or(0);
    recurrence_vector(start_week, step, year)
}

/// Same as [`generate_recurrence`] with a raw step in weeks; a zero step
/// yields an all-false vector.
pub fn recurrence_vector(start_week: u32, step: u32, year: i32) -> Vec<bool> {
    let len = calendar::weeks_in_year(year) as usize;
    let mut weeks = vec![false; len];
    if step == 0 || start_week == 0 || start_week as usize > len {
        return weeks;
    }
    for index in (start_week as usize - 1..len).step_by(step as usize) {
        weeks[index] = true;
    }
    weeks
}

/// First due week in the registration year, or `None` when one step past the
/// registration week already falls in the next year.
pub fn registration_start_week(registered_on: NaiveDate, cadence: Cadence) -> Option<u32> {
    let (week, year) = calendar::week_of_year(registered_on);
    let weeks = calendar::weeks_in_year(year);
    let step = cadence.step(year);
    if week + step > weeks {
        return None;
    }
    Some(((week + step - 1) % weeks) + 1)
}

/// Start week in the year after the one whose last due index is `last_index`.
///
/// `step` and `weeks` belong to that previous year so the cycle carries over
/// the boundary unchanged.
pub fn next_start_week(last_index: usize, step: u32, weeks: u32) -> u32 {
    ((last_index as u32 + step) % weeks) + 1
}

/// Last ISO year that must have schedules on `today`.
///
/// Never earlier than the ISO year of `today`, so late-December days that
/// already belong to next year's week 1 are covered.
pub fn horizon_year(today: NaiveDate, lookahead_month: u32) -> i32 {
    let calendar_horizon = if today.month() >= lookahead_month {
        today.year() + 1
    } else {
        today.year()
    };
    calendar_horizon.max(calendar::week_of_year(today).1)
}

/// Due-week vector for `year` given the asset's anchor data and the schedule
/// of `year - 1`, if one exists.
pub fn plan_year(
    registered_on: NaiveDate,
    cadence: Cadence,
    year: i32,
    previous: Option<&DueSchedule>,
) -> Vec<bool> {
    let (reg_week, reg_year) = calendar::week_of_year(registered_on);
    let empty = || vec![false; calendar::weeks_in_year(year) as usize];
    if year < reg_year {
        return empty();
    }
    if year == reg_year {
        return match registration_start_week(registered_on, cadence) {
            Some(start) => generate_recurrence(start, Some(cadence), year),
            None => empty(),
        };
    }

    let prev_year = year - 1;
    let anchor = previous
        .filter(|p| p.year == prev_year)
        .and_then(DueSchedule::last_due_index)
        .or_else(|| (prev_year == reg_year).then(|| reg_week as usize - 1));

    let start = match anchor {
        Some(index) => next_start_week(
            index,
            cadence.step(prev_year),
            calendar::weeks_in_year(prev_year),
        ),
        None => 1,
    };
    generate_recurrence(start, Some(cadence), year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::AssetId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn due_weeks(weeks: &[bool]) -> Vec<u32> {
        weeks
            .iter()
            .enumerate()
            .filter(|(_, &d)| d)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    #[test]
    fn test_weekly_from_week_one_fills_year() {
        let weeks = generate_recurrence(1, Some(Cadence::Weekly), 2025);
        assert_eq!(weeks.len(), 52);
        assert!(weeks.iter().all(|&d| d));
    }

    #[test]
    fn test_true_count_and_positions() {
        for year in [2025, 2026] {
            let total = calendar::weeks_in_year(year);
            for cadence in Cadence::ALL {
                let step = cadence.step(year);
                for start in 1..=total {
                    let weeks = generate_recurrence(start, Some(cadence), year);
                    assert_eq!(weeks.len(), total as usize);
                    let expected = (total - start) / step + 1;
                    let due = due_weeks(&weeks);
                    assert_eq!(due.len() as u32, expected, "{:?} start {} {}", cadence, start, year);
                    for (n, week) in due.iter().enumerate() {
                        assert_eq!(*week, start + n as u32 * step);
                    }
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_inputs_yield_empty_vector() {
        assert!(generate_recurrence(0, Some(Cadence::Weekly), 2025).iter().all(|&d| !d));
        assert!(generate_recurrence(53, Some(Cadence::Weekly), 2025).iter().all(|&d| !d));
        assert!(generate_recurrence(5, None, 2025).iter().all(|&d| !d));
        assert!(recurrence_vector(5, 0, 2026).iter().all(|&d| !d));
        assert_eq!(generate_recurrence(53, Some(Cadence::Weekly), 2026).len(), 53);
    }

    #[test]
    fn test_registration_start_is_after_registration_week() {
        // 2025-01-15 is ISO week 3; monthly steps four weeks.
        assert_eq!(registration_start_week(date(2025, 1, 15), Cadence::Monthly), Some(7));
        assert_eq!(registration_start_week(date(2025, 1, 15), Cadence::Weekly), Some(4));
        // Week 50 + 4 runs off the end of 2025.
        assert_eq!(registration_start_week(date(2025, 12, 10), Cadence::Monthly), None);
        assert_eq!(registration_start_week(date(2025, 1, 15), Cadence::Annual), None);
    }

    #[test]
    fn test_next_start_week_wraps() {
        // Last due week 51 (index 50), biweekly: week 53 of a 52-week year is week 1.
        assert_eq!(next_start_week(50, 2, 52), 1);
        // Last due week 52 (index 51), biweekly.
        assert_eq!(next_start_week(51, 2, 52), 2);
        // Quarterly from week 40.
        assert_eq!(next_start_week(39, 13, 52), 1);
        // Weekly out of a 53-week year.
        assert_eq!(next_start_week(52, 1, 53), 1);
    }

    #[test]
    fn test_horizon_year() {
        assert_eq!(horizon_year(date(2025, 9, 30), DEFAULT_LOOKAHEAD_MONTH), 2025);
        assert_eq!(horizon_year(date(2025, 10, 1), DEFAULT_LOOKAHEAD_MONTH), 2026);
        assert_eq!(horizon_year(date(2025, 12, 31), DEFAULT_LOOKAHEAD_MONTH), 2026);
        assert_eq!(horizon_year(date(2025, 3, 1), 3), 2026);
    }

    #[test]
    fn test_horizon_covers_iso_year_of_today() {
        // 2025-12-29 is 2026-W01.
        assert_eq!(horizon_year(date(2025, 12, 29), 13), 2026);
        assert_eq!(horizon_year(date(2025, 12, 28), 13), 2025);
        // 2027-01-01 is still 2026-W53; the calendar year wins.
        assert_eq!(horizon_year(date(2027, 1, 1), 13), 2027);
    }

    #[test]
    fn test_plan_registration_year() {
        let weeks = plan_year(date(2025, 1, 15), Cadence::Monthly, 2025, None);
        assert_eq!(due_weeks(&weeks)[..3], [7, 11, 15]);
        assert_eq!(due_weeks(&weeks).last(), Some(&51));
    }

    #[test]
    fn test_plan_continues_across_year_boundary() {
        let id = AssetId::new();
        let registered = date(2025, 1, 15);
        let y2025 = DueSchedule::new(id, 2025, plan_year(registered, Cadence::Monthly, 2025, None)).unwrap();
        // Last due 2025 week is 51; 51 + 4 = 55 -> 2026 week 3.
        let y2026 = plan_year(registered, Cadence::Monthly, 2026, Some(&y2025));
        assert_eq!(due_weeks(&y2026)[0], 3);
    }

    #[test]
    fn test_plan_weekly_into_53_week_year() {
        let id = AssetId::new();
        let registered = date(2024, 6, 3);
        let y2024 = DueSchedule::new(id, 2024, plan_year(registered, Cadence::Weekly, 2024, None)).unwrap();
        let y2025 = DueSchedule::new(id, 2025, plan_year(registered, Cadence::Weekly, 2025, Some(&y2024))).unwrap();
        let y2026 = plan_year(registered, Cadence::Weekly, 2026, Some(&y2025));
        assert!(y2025.weeks().iter().all(|&d| d));
        assert_eq!(y2026.len(), 53);
        assert!(y2026.iter().all(|&d| d));
    }

    #[test]
    fn test_plan_after_wrapping_registration() {
        let registered = date(2025, 12, 10); // week 50
        let id = AssetId::new();
        let y2025 = DueSchedule::new(id, 2025, plan_year(registered, Cadence::Monthly, 2025, None)).unwrap();
        assert!(y2025.due_weeks().is_empty());
        // 50 + 4 = 54 -> 2026 week 2.
        let y2026 = plan_year(registered, Cadence::Monthly, 2026, Some(&y2025));
        assert_eq!(due_weeks(&y2026)[0], 2);
    }

    #[test]
    fn test_plan_annual_keeps_week() {
        let registered = date(2025, 1, 15);
        let id = AssetId::new();
        let y2025 = DueSchedule::new(id, 2025, plan_year(registered, Cadence::Annual, 2025, None)).unwrap();
        let y2026 = DueSchedule::new(id, 2026, plan_year(registered, Cadence::Annual, 2026, Some(&y2025))).unwrap();
        let y2027 = plan_year(registered, Cadence::Annual, 2027, Some(&y2026));
        assert!(y2025.due_weeks().is_empty());
        assert_eq!(y2026.due_weeks(), vec![3]);
        assert_eq!(due_weeks(&y2027), vec![3]);
    }

    #[test]
    fn test_plan_empty_previous_restarts_at_week_one() {
        let id = AssetId::new();
        let empty = DueSchedule::new(id, 2026, vec![false; 53]).unwrap();
        let weeks = plan_year(date(2024, 5, 1), Cadence::Quarterly, 2027, Some(&empty));
        assert_eq!(due_weeks(&weeks), vec![1, 14, 27, 40]);
    }
}
