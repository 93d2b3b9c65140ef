//! Duration formatting and calendar helpers shared by the store, exports and analytics.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TrackerError};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Format seconds as `HH:MM:SS`; hours are not wrapped at 24 or 100
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Inverse of [`format_elapsed`]
pub fn parse_elapsed(value: &str) -> Option<u64> {
    let mut parts = value.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let secs: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || secs >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + secs)
}

/// Parse a wall-clock `HH:MM` value
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| TrackerError::Validation(format!("invalid time of day '{}', expected HH:MM", value)))
}

/// Length of the interval from `start` to `end` as `HH:MM`.
///
/// An end earlier than the start is read as finishing on the next day.
pub fn duration_between(start: &str, end: &str) -> Result<String> {
    let start = parse_time_of_day(start)?;
    let end = parse_time_of_day(end)?;

    let start_minutes = i64::from(start.hour() * 60 + start.minute());
    let end_minutes = i64::from(end.hour() * 60 + end.minute());
    let minutes = (end_minutes - start_minutes).rem_euclid(MINUTES_PER_DAY);

    Ok(format!("{:02}:{:02}", minutes / 60, minutes % 60))
}

/// ISO-8601 week number (the week holding the year's first Thursday is week 1)
pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// `YYYY-MM-DD`
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `{ISO week-year}-W{week}` with a two-digit week so keys sort chronologically
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// `YYYY-MM`
pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// Calendar date of a stored task date.
///
/// Accepts a plain `YYYY-MM-DD`, an RFC 3339 timestamp (converted to the local
/// clock) or a naive `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn parse_task_date(value: &str) -> Option<NaiveDate> {
    parse_task_moment(value).map(|moment| moment.date())
}

/// Local date-time of a stored task date; date-only values sit at midnight
pub fn parse_task_moment(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Inclusive membership test: `from` is widened to 00:00:00.000 and `to` to 23:59:59.999
pub fn date_in_range(moment: NaiveDateTime, from: NaiveDate, to: NaiveDate) -> bool {
    let start = from.and_time(NaiveTime::MIN);
    let end = to
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| (to + Duration::days(1)).and_time(NaiveTime::MIN));

    moment >= start && moment <= end
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// A missing `to` makes a single-day range
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Self {
        Self {
            from,
            to: to.unwrap_or(from),
        }
    }

    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        date_in_range(moment, self.from, self.to)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{} to {}", self.from, self.to)
        }
    }
}

/// Named ranges relative to today. Weeks start on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    Today,
    Yesterday,
    Last7Days,
    Last14Days,
    Last30Days,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
}

impl RangePreset {
    pub fn resolve(self, today: NaiveDate) -> DateRange {
        let days = |n: i64| Duration::days(n);
        let since_sunday = i64::from(today.weekday().num_days_from_sunday());
        let first_of_month = today - days(i64::from(today.day0()));

        let (from, to) = match self {
            RangePreset::Today => (today, today),
            RangePreset::Yesterday => (today - days(1), today - days(1)),
            RangePreset::Last7Days => (today - days(6), today),
            RangePreset::Last14Days => (today - days(13), today),
            RangePreset::Last30Days => (today - days(29), today),
            RangePreset::ThisWeek => (today - days(since_sunday), today),
            RangePreset::LastWeek => {
                let last_saturday = today - days(since_sunday + 1);
                (last_saturday - days(6), last_saturday)
            }
            RangePreset::ThisMonth => (first_of_month, today),
            RangePreset::LastMonth => {
                let end = first_of_month - days(1);
                (end - days(i64::from(end.day0())), end)
            }
            RangePreset::ThisYear => (today - days(i64::from(today.ordinal0())), today),
        };

        DateRange { from, to }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangePreset::Today => "today",
            RangePreset::Yesterday => "yesterday",
            RangePreset::Last7Days => "last7days",
            RangePreset::Last14Days => "last14days",
            RangePreset::Last30Days => "last30days",
            RangePreset::ThisWeek => "thisWeek",
            RangePreset::LastWeek => "lastWeek",
            RangePreset::ThisMonth => "thisMonth",
            RangePreset::LastMonth => "lastMonth",
            RangePreset::ThisYear => "thisYear",
        }
    }
}

impl FromStr for RangePreset {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "today" => Ok(RangePreset::Today),
            "yesterday" => Ok(RangePreset::Yesterday),
            "last7days" => Ok(RangePreset::Last7Days),
            "last14days" => Ok(RangePreset::Last14Days),
            "last30days" => Ok(RangePreset::Last30Days),
            "thisweek" => Ok(RangePreset::ThisWeek),
            "lastweek" => Ok(RangePreset::LastWeek),
            "thismonth" => Ok(RangePreset::ThisMonth),
            "lastmonth" => Ok(RangePreset::LastMonth),
            "thisyear" => Ok(RangePreset::ThisYear),
            _ => Err(TrackerError::Validation(format!("unknown date range '{}'", s))),
        }
    }
}
