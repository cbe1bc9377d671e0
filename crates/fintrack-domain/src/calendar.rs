//! Calendar arithmetic used by schedules, budget windows and recurrences.
//!
//! Month arithmetic clamps to the last day of the target month, so
//! `Jan 31 + 1 month` lands on `Feb 28` (or `Feb 29` in leap years).

use chrono::{Datelike, Duration, NaiveDate};

/// Shifts `date` by a signed number of months, clamping the day of month.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

/// Shifts `date` by a signed number of years, clamping Feb 29.
pub fn shift_year(date: NaiveDate, years: i32) -> NaiveDate {
    shift_month(date, years * 12)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Returns `date` with its day replaced by `day`, clamped to the month length.
pub fn with_day_clamped(date: NaiveDate, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(date.year(), date.month()));
    date.with_day(day).unwrap_or(date)
}

/// First date on or after `reference` whose day of month is `day` (clamped
/// to shorter months).
pub fn next_day_of_month(reference: NaiveDate, day: u32) -> NaiveDate {
    let candidate = with_day_clamped(reference, day);
    if candidate >= reference {
        return candidate;
    }
    let next_month = shift_month(reference.with_day(1).unwrap_or(reference), 1);
    with_day_clamped(next_month, day)
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}
