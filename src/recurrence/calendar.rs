//! Calendar arithmetic that clamps to the end of shorter months instead of
//! rolling over into the next month.

use time::{Date, Month};

/// The last day of `month` in `year`, e.g. 29 for February 2024.
pub fn last_day_of_month(year: i32, month: Month) -> u8 {
    let (next_year, next_month) = match month {
        Month::December => (year + 1, Month::January),
        month => (year, month.next()),
    };

    Date::from_calendar_date(next_year, next_month, 1)
        .ok()
        .and_then(|first_of_next_month| first_of_next_month.previous_day())
        .map(|last_day| last_day.day())
        // December of the last supported year.
        .unwrap_or(31)
}

/// Move `date` to `day` within the same month, clamped to the month's last day.
pub fn with_day_clamped(date: Date, day: u8) -> Date {
    let day = day.clamp(1, last_day_of_month(date.year(), date.month()));

    date.replace_day(day).unwrap_or(date)
}

/// Add `months` calendar months to `date`.
///
/// The day of the month is kept where possible and clamped to the last day
/// of the target month otherwise, so 2024-01-31 plus one month is 2024-02-29.
///
/// Returns `None` if the result is outside the supported calendar range.
pub fn add_months_clamped(date: Date, months: u32) -> Option<Date> {
    let month_index = i64::from(date.year()) * 12 + i64::from(u8::from(date.month()) - 1);
    let target_index = month_index.checked_add(i64::from(months))?;

    let year = i32::try_from(target_index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(target_index.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).ok()
}

/// Add `years` calendar years to `date`, clamping February 29 to February 28
/// in non-leap years.
///
/// Returns `None` if the result is outside the supported calendar range.
pub fn add_years_clamped(date: Date, years: u32) -> Option<Date> {
    add_months_clamped(date, years.checked_mul(12)?)
}
