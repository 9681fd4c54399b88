use chrono::{Datelike, NaiveDate};

use crate::engine::rules::CycleDay;

/// Decision dates within `[start, target]`, ascending and without duplicates.
///
/// Every configured cycle day is tried for each year from `start.year()` through
/// `target.year()`. Empty when `target` precedes the first candidate.
pub fn cycle_dates(start: NaiveDate, target: NaiveDate, days: &[CycleDay]) -> Vec<NaiveDate> {
    if target < start {
        return Vec::new();
    }
    let mut dates: Vec<NaiveDate> = (start.year()..=target.year())
        .flat_map(|year| days.iter().filter_map(move |day| day.in_year(year)))
        .filter(|date| (start..=target).contains(date))
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::default_cycle_days;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    #[test]
    fn produces_both_cycles_per_year_in_window() {
        let dates = cycle_dates(d(2025, 1, 1), d(2026, 12, 31), &default_cycle_days());
        assert_eq!(
            dates,
            vec![d(2025, 6, 26), d(2025, 11, 29), d(2026, 6, 26), d(2026, 11, 29)]
        );
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let dates = cycle_dates(d(2025, 6, 26), d(2025, 11, 29), &default_cycle_days());
        assert_eq!(dates, vec![d(2025, 6, 26), d(2025, 11, 29)]);
    }

    #[test]
    fn start_after_first_cycle_of_year_skips_it() {
        let dates = cycle_dates(d(2025, 7, 1), d(2026, 7, 1), &default_cycle_days());
        assert_eq!(dates, vec![d(2025, 11, 29), d(2026, 6, 26)]);
    }

    #[test]
    fn target_before_first_cycle_is_empty() {
        assert!(cycle_dates(d(2025, 7, 1), d(2025, 11, 28), &default_cycle_days()).is_empty());
        assert!(cycle_dates(d(2025, 7, 1), d(2024, 1, 1), &default_cycle_days()).is_empty());
    }

    #[test]
    fn unordered_and_repeated_days_are_normalised() {
        let days = vec![CycleDay::new(11, 29), CycleDay::new(6, 26), CycleDay::new(11, 29)];
        let dates = cycle_dates(d(2025, 1, 1), d(2025, 12, 31), &days);
        assert_eq!(dates, vec![d(2025, 6, 26), d(2025, 11, 29)]);
    }

    #[test]
    fn leap_day_only_in_leap_years() {
        let days = vec![CycleDay::new(2, 29)];
        let dates = cycle_dates(d(2023, 1, 1), d(2025, 12, 31), &days);
        assert_eq!(dates, vec![d(2024, 2, 29)]);
    }
}
