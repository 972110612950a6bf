//! Calendar date ranges for recording queries.
//!
//! The recordings API filters by inclusive calendar dates in `YYYY-MM-DD`
//! form. [`DateRange`] resolves user input against the wall clock: a missing
//! `to` means today, a missing `from` means the date 24 hours ago.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use thiserror::Error;

/// Date format used on the command line and in API queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors produced while resolving a date range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    /// A date argument did not parse as `YYYY-MM-DD`.
    #[error("invalid {field} date '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    /// The start of the range lies after its end.
    #[error("invalid date range: from {from} is after to {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day of the range (inclusive).
    pub from: NaiveDate,
    /// Last day of the range (inclusive).
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DateRangeError> {
        if from > to {
            return Err(DateRangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// Resolves optional `from`/`to` arguments against the local wall clock.
    pub fn resolve(from: Option<&str>, to: Option<&str>) -> Result<Self, DateRangeError> {
        Self::resolve_at(from, to, Local::now())
    }

    /// Resolves optional `from`/`to` arguments against the given instant.
    ///
    /// Defaults are computed in the timezone of `now`; no other
    /// normalization takes place.
    pub fn resolve_at<Tz: TimeZone>(
        from: Option<&str>,
        to: Option<&str>,
        now: DateTime<Tz>,
    ) -> Result<Self, DateRangeError> {
        let to = match non_empty(to) {
            Some(value) => parse_date("to", value)?,
            None => now.date_naive(),
        };
        let from = match non_empty(from) {
            Some(value) => parse_date("from", value)?,
            None => (now - Duration::hours(24)).date_naive(),
        };
        Self::new(from, to)
    }

    /// Returns the start date formatted for API queries.
    pub fn from_param(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    /// Returns the end date formatted for API queries.
    pub fn to_param(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from_param(), self.to_param())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DateRangeError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
