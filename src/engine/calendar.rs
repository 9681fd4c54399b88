//! Calendar arithmetic shared by the engines and the loaders.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

/// Whole calendar years from `from` to `to`.
///
/// An anniversary that does not exist in the target year (Feb 29) falls on the
/// last day of that month, so someone born on 2000-02-29 is 63 on 2063-02-28.
/// Negative when `to` precedes `from`.
pub fn whole_years_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let mut years = to.year() - from.year();
    if years > 0 && anniversary(from, years).map_or(true, |date| date > to) {
        years -= 1;
    } else if years < 0 && anniversary(from, years).map_or(true, |date| date < to) {
        years += 1;
    }
    years
}

fn anniversary(from: NaiveDate, years: i32) -> Option<NaiveDate> {
    let months = Months::new(years.unsigned_abs().checked_mul(12)?);
    if years >= 0 {
        from.checked_add_months(months)
    } else {
        from.checked_sub_months(months)
    }
}

const DAY_FIRST_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const ISO_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const ISO_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a date written day-first (`26/06/2025`), or ISO (`2025-06-26`, optionally with a time).
/// Two-digit years are rejected.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let parsed = DAY_FIRST_FORMATS
        .iter()
        .chain(ISO_FORMATS)
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            ISO_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date())
        })?;
    (parsed.year() >= 1000).then_some(parsed)
}

/// Day-first rendering used in reports and exported sheets.
pub fn format_day_first(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    #[test]
    fn whole_years_truncates_partial_years() {
        assert_eq!(whole_years_between(d(2019, 6, 27), d(2025, 6, 26)), 5);
        assert_eq!(whole_years_between(d(2019, 6, 26), d(2025, 6, 26)), 6);
        assert_eq!(whole_years_between(d(2019, 6, 25), d(2025, 6, 26)), 6);
        assert_eq!(whole_years_between(d(2025, 6, 26), d(2025, 6, 26)), 0);
    }

    #[test]
    fn leap_day_anniversary_falls_on_feb_28() {
        assert_eq!(whole_years_between(d(2000, 2, 29), d(2063, 2, 28)), 63);
        assert_eq!(whole_years_between(d(2000, 2, 29), d(2063, 2, 27)), 62);
        assert_eq!(whole_years_between(d(2000, 2, 29), d(2064, 2, 28)), 63);
        assert_eq!(whole_years_between(d(2000, 2, 29), d(2064, 2, 29)), 64);
    }

    #[test]
    fn whole_years_is_negative_backwards() {
        assert_eq!(whole_years_between(d(2025, 6, 26), d(2020, 6, 27)), -4);
        assert_eq!(whole_years_between(d(2025, 6, 26), d(2020, 6, 26)), -5);
    }

    #[test]
    fn parses_day_first_and_iso() {
        assert_eq!(parse_day_first("05/03/2010"), Some(d(2010, 3, 5)));
        assert_eq!(parse_day_first(" 05-03-2010 "), Some(d(2010, 3, 5)));
        assert_eq!(parse_day_first("05.03.2010"), Some(d(2010, 3, 5)));
        assert_eq!(parse_day_first("2010-03-05"), Some(d(2010, 3, 5)));
        assert_eq!(parse_day_first("2010-03-05 00:00:00"), Some(d(2010, 3, 5)));
        assert_eq!(parse_day_first(""), None);
        assert_eq!(parse_day_first("31/02/2010"), None);
        assert_eq!(parse_day_first("05/03/10"), None);
        assert_eq!(parse_day_first("yesterday"), None);
    }

    #[test]
    fn formats_day_first() {
        assert_eq!(format_day_first(d(2026, 11, 29)), "29/11/2026");
    }
}
