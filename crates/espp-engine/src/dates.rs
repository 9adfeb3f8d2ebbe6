//! Calendar helpers
//!
//! Day-granularity date parsing and the holding-period thresholds that
//! separate the three disposition timelines.

use crate::error::ValidationError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Parse a `YYYY-MM-DD` date or an ISO-8601 timestamp.
///
/// Timestamps carrying an offset are reduced to their UTC calendar day;
/// timestamps without one are taken as-is.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }

    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(timestamp.date());
    }

    Err(ValidationError::invalid_field(field, value))
}

/// Shift a date by whole calendar years.
///
/// February 29 rolls forward to March 1 when the target year has no leap
/// day, the same way a calendar "set year" overflows.
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;

    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(date)
}

/// First day on which a sale is taxed as a long-term capital gain.
pub fn long_term_date(purchase_date: NaiveDate) -> NaiveDate {
    add_years(purchase_date, 1)
}

/// First day on which a sale counts as a qualifying disposition: two years
/// after grant and one year after purchase, whichever comes later.
pub fn qualifying_date(grant_date: NaiveDate, purchase_date: NaiveDate) -> NaiveDate {
    add_years(grant_date, 2).max(long_term_date(purchase_date))
}
