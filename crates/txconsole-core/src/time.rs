//! Calendar helpers for the filter editor and transaction display

use crate::models::{parse_datetime, Filter};
use chrono::{Datelike, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Every calendar day of `month` (1-12) in `year`, in ascending order
///
/// Returns an empty list for a month outside 1-12.
pub fn days_in_month(month: u32, year: i32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month && d.year() == year)
        .collect()
}

/// English month name for 1-12
pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
}

/// Years offered by the year selector, oldest first
pub fn selectable_years(start_year: i32, current_year: i32) -> Vec<i32> {
    (start_year..=current_year).collect()
}

/// Heading text for a filter, e.g. `February 2016` or `February 09, 2016`
pub fn period_label(filter: &Filter) -> String {
    let month = month_name(filter.month).unwrap_or("Unknown month");
    match filter.day {
        Some(day) => format!("{} {:02}, {}", month, day, filter.year),
        None => format!("{} {}", month, filter.year),
    }
}

/// Format a stored date/time as `MM/DD/YYYY, HH:MM AM`; unparseable text is returned unchanged
pub fn display_datetime(value: &str) -> String {
    match parse_datetime(value) {
        Some(dt) => dt.format("%m/%d/%Y, %I:%M %p").to_string(),
        None => value.to_string(),
    }
}
