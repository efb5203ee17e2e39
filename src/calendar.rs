use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, Weekday};

use crate::errors::{ArrangementError, Result};

/// add (or subtract, when negative) whole days
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };

    shifted.ok_or_else(|| ArrangementError::InvalidDate {
        message: format!("{} shifted by {} days is out of range", date, days),
    })
}

/// add whole weeks
pub fn add_weeks(date: NaiveDate, weeks: u32) -> Result<NaiveDate> {
    add_days(date, i64::from(weeks) * 7)
}

/// add calendar months, clamping to the last day of shorter months
/// (31 Jan + 1 month = 28/29 Feb)
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ArrangementError::InvalidDate {
            message: format!("{} plus {} months is out of range", date, months),
        })
}

/// first day of the week containing `date`
pub fn start_of_week(date: NaiveDate, week_starts_on: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - week_starts_on.num_days_from_monday()) % 7;
    date - chrono::Duration::days(i64::from(offset))
}

/// last day of the week containing `date`
pub fn end_of_week(date: NaiveDate, week_starts_on: Weekday) -> NaiveDate {
    start_of_week(date, week_starts_on) + chrono::Duration::days(6)
}

pub fn is_same_day(a: NaiveDate, b: NaiveDate) -> bool {
    a == b
}

/// signed number of days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// day/month/year as shown in messages, e.g. 05/03/2025
pub fn format_day_month_year(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// parse a 24h `HH:MM` time of day
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M").map_err(|_| ArrangementError::InvalidDate {
        message: format!("{:?} is not a HH:MM time", input),
    })
}
