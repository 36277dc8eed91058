//! Date ranges and the lookback-vs-explicit resolution rule.
//!
//! A `DateRange` is inclusive on both ends: every calendar day from `start`
//! through `end` is one partition the remote API is queried for. Ranges are
//! produced from a `RangeRequest`, where explicit dates always win over
//! `lookback_days`.

use chrono::{Days, NaiveDate, NaiveTime};
use std::fmt;
use thiserror::Error;

/// Input and output date format (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from resolving a date range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid format for start_date '{0}': it should be YYYY-MM-DD")]
    InvalidStartDate(String),

    #[error("invalid format for end_date '{0}': it should be YYYY-MM-DD")]
    InvalidEndDate(String),

    #[error("end_date {end} cannot be before start_date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("lookback of {0} days reaches outside the supported calendar")]
    LookbackOutOfRange(u32),
}

/// Inclusive calendar-day range. Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whole days between `start` and `end` (zero for a single-day range).
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Number of daily partitions in the range.
    pub fn partition_count(&self) -> usize {
        self.span_days() as usize + 1
    }

    /// Every calendar day in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Seconds since the Unix epoch at UTC midnight of `start`.
    pub fn start_epoch(&self) -> i64 {
        utc_midnight_epoch(self.start)
    }

    /// Seconds since the Unix epoch at UTC midnight of `end`.
    pub fn end_epoch(&self) -> i64 {
        utc_midnight_epoch(self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn utc_midnight_epoch(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Unresolved range inputs as they arrive from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub lookback_days: u32,
}

impl RangeRequest {
    pub fn lookback(days: u32) -> Self {
        Self {
            start_date: None,
            end_date: None,
            lookback_days: days,
        }
    }

    pub fn explicit(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_date: Some(start.into()),
            end_date: Some(end.into()),
            lookback_days: 0,
        }
    }

    /// Resolve against an explicit "today".
    ///
    /// - `end` is `end_date` if given, else `today`
    /// - `start` is `start_date` if given, else `end - lookback_days`
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange, RangeError> {
        let end = match non_empty(&self.end_date) {
            Some(raw) => parse_date(raw).ok_or_else(|| RangeError::InvalidEndDate(raw.into()))?,
            None => today,
        };

        let start = match non_empty(&self.start_date) {
            Some(raw) => {
                parse_date(raw).ok_or_else(|| RangeError::InvalidStartDate(raw.into()))?
            }
            None => end
                .checked_sub_days(Days::new(u64::from(self.lookback_days)))
                .ok_or(RangeError::LookbackOutOfRange(self.lookback_days))?,
        };

        DateRange::new(start, end)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}
