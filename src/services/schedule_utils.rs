use chrono::{Datelike, Duration, NaiveDate};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::settings::Weekday;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|err| {
        AppError::validation_with_details(
            "invalid date format, expected YYYY-MM-DD",
            json!({"value": value, "error": err.to_string()}),
        )
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn weekday_of(date: NaiveDate) -> Weekday {
    Weekday::from_chrono(date.weekday())
}

pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(1))
}

/// Inclusive day count of `[start, end]`, zero when the window is inverted.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

/// Every date in `[start, end)`.
pub fn dates_until(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date < end)
}

/// Study days in a window of `total_days`, assuming `days_per_week` of every
/// seven are used regardless of which weekdays they fall on.
pub fn prorated_study_days(total_days: i64, days_per_week: u8) -> i64 {
    let per_week = i64::from(days_per_week);
    let full_weeks = total_days / 7;
    let remainder = total_days % 7;
    full_weeks * per_week + remainder.min(per_week)
}

/// "35min" below one hour, otherwise hours to one decimal ("2.5h", "1h").
pub fn format_hours(hours: f64) -> String {
    if hours < 1.0 {
        format!("{}min", (hours * 60.0).round() as i64)
    } else {
        let rounded = (hours * 10.0).round() / 10.0;
        format!("{rounded}h")
    }
}
