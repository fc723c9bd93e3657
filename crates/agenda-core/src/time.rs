//! Time types for calendar events.
//!
//! This module provides [`EventTime`] for representing event start/end times
//! (which may be either a specific datetime or an all-day date),
//! [`TimeWindow`] for defining query ranges, and [`WindowStrategy`] for
//! deriving a window from the current time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Represents the time of a calendar event.
///
/// Calendar events can have two types of times:
/// - **DateTime**: A specific point in time (with timezone, stored as UTC)
/// - **AllDay**: A date without a specific time (all-day events)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific datetime, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a new `EventTime::DateTime` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a new `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns `true` if this is a specific datetime.
    pub fn is_datetime(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }

    /// Returns the datetime if this is a `DateTime` variant.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            Self::AllDay(_) => None,
        }
    }

    /// Returns the date if this is an `AllDay` variant.
    pub fn as_date(&self) -> Option<&NaiveDate> {
        match self {
            Self::AllDay(d) => Some(d),
            Self::DateTime(_) => None,
        }
    }

    /// Converts to a UTC datetime for comparison purposes.
    ///
    /// For all-day events, returns midnight UTC on that date.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
        }
    }

    /// Returns the date portion of this event time.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC. Windows are derived
/// from "now" at fetch time and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a time window starting from now extending the given duration.
    pub fn from_now(now: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(now, now + duration)
    }

    /// Creates a window spanning the calendar month that contains `now`.
    ///
    /// Runs from the first instant of the month to the first instant of the
    /// next month.
    pub fn calendar_month(now: DateTime<Utc>) -> Self {
        let first = now.date_naive().with_day(1).expect("day 1 is valid");
        let next_first = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
        }
        .expect("first of month is valid");

        Self {
            start: first.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
            end: next_first.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
        }
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }
}

/// How to derive the query window from the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStrategy {
    /// The current calendar month.
    #[default]
    CalendarMonth,
    /// From now to thirty days ahead.
    Rolling30Days,
}

impl WindowStrategy {
    /// Computes the time window for this strategy at the given instant.
    pub fn window_at(&self, now: DateTime<Utc>) -> TimeWindow {
        match self {
            Self::CalendarMonth => TimeWindow::calendar_month(now),
            Self::Rolling30Days => TimeWindow::from_now(now, Duration::days(30)),
        }
    }

    /// Returns the configuration name of this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CalendarMonth => "calendar_month",
            Self::Rolling30Days => "rolling30_days",
        }
    }
}

impl fmt::Display for WindowStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WindowStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" | "calendar_month" | "calendar-month" => Ok(Self::CalendarMonth),
            "rolling30" | "rolling30_days" | "rolling-30-days" => Ok(Self::Rolling30Days),
            other => Err(format!("unknown window strategy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod event_time {
        use super::*;

        #[test]
        fn datetime_creation() {
            let dt = utc(2025, 2, 5, 10, 30, 0);
            let et = EventTime::from_utc(dt);
            assert!(et.is_datetime());
            assert!(!et.is_all_day());
            assert_eq!(et.as_datetime(), Some(&dt));
            assert_eq!(et.as_date(), None);
        }

        #[test]
        fn allday_creation() {
            let d = date(2025, 2, 5);
            let et = EventTime::from_date(d);
            assert!(et.is_all_day());
            assert!(!et.is_datetime());
            assert_eq!(et.as_date(), Some(&d));
            assert_eq!(et.as_datetime(), None);
        }

        #[test]
        fn to_utc_datetime() {
            let dt = utc(2025, 2, 5, 10, 30, 0);
            assert_eq!(EventTime::from_utc(dt).to_utc_datetime(), dt);

            let d = date(2025, 2, 5);
            assert_eq!(
                EventTime::from_date(d).to_utc_datetime(),
                utc(2025, 2, 5, 0, 0, 0)
            );
        }

        #[test]
        fn ordering() {
            let et1 = EventTime::from_utc(utc(2025, 2, 5, 10, 0, 0));
            let et2 = EventTime::from_utc(utc(2025, 2, 5, 11, 0, 0));
            let et3 = EventTime::from_date(date(2025, 2, 5));

            assert!(et3 < et1); // midnight < 10:00
            assert!(et1 < et2);
        }

        #[test]
        fn serde_roundtrip() {
            let et = EventTime::from_utc(utc(2025, 2, 5, 10, 30, 0));
            let json = serde_json::to_string(&et).unwrap();
            let parsed: EventTime = serde_json::from_str(&json).unwrap();
            assert_eq!(et, parsed);
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn creation() {
            let start = utc(2025, 2, 5, 9, 0, 0);
            let end = utc(2025, 2, 5, 17, 0, 0);
            let window = TimeWindow::new(start, end);
            assert_eq!(window.start, start);
            assert_eq!(window.end, end);
            assert_eq!(window.duration(), Duration::hours(8));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_window() {
            TimeWindow::new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 9, 0, 0));
        }

        #[test]
        fn contains_half_open() {
            let window = TimeWindow::new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0));

            assert!(window.contains(utc(2025, 2, 5, 9, 0, 0))); // start inclusive
            assert!(window.contains(utc(2025, 2, 5, 16, 59, 59)));
            assert!(!window.contains(utc(2025, 2, 5, 17, 0, 0))); // end exclusive
            assert!(!window.contains(utc(2025, 2, 5, 8, 59, 59)));
        }

        #[test]
        fn calendar_month_mid_month() {
            let window = TimeWindow::calendar_month(utc(2025, 2, 14, 15, 30, 0));
            assert_eq!(window.start, utc(2025, 2, 1, 0, 0, 0));
            assert_eq!(window.end, utc(2025, 3, 1, 0, 0, 0));
        }

        #[test]
        fn calendar_month_december_rollover() {
            let window = TimeWindow::calendar_month(utc(2024, 12, 31, 23, 59, 59));
            assert_eq!(window.start, utc(2024, 12, 1, 0, 0, 0));
            assert_eq!(window.end, utc(2025, 1, 1, 0, 0, 0));
        }

        #[test]
        fn from_now() {
            let now = utc(2025, 2, 5, 10, 0, 0);
            let window = TimeWindow::from_now(now, Duration::days(30));
            assert_eq!(window.start, now);
            assert_eq!(window.end, utc(2025, 3, 7, 10, 0, 0));
        }
    }

    mod window_strategy {
        use super::*;

        #[test]
        fn month_window() {
            let now = utc(2025, 6, 20, 8, 0, 0);
            let window = WindowStrategy::CalendarMonth.window_at(now);
            assert_eq!(window.start, utc(2025, 6, 1, 0, 0, 0));
            assert_eq!(window.end, utc(2025, 7, 1, 0, 0, 0));
        }

        #[test]
        fn rolling_window_spans_exactly_thirty_days() {
            let now = utc(2025, 6, 20, 8, 0, 0);
            let window = WindowStrategy::Rolling30Days.window_at(now);
            assert_eq!(window.start, now);
            assert_eq!(window.duration(), Duration::days(30));
        }

        #[test]
        fn parse_from_str() {
            assert_eq!(
                "month".parse::<WindowStrategy>().unwrap(),
                WindowStrategy::CalendarMonth
            );
            assert_eq!(
                "rolling30".parse::<WindowStrategy>().unwrap(),
                WindowStrategy::Rolling30Days
            );
            assert!("fortnight".parse::<WindowStrategy>().is_err());
        }

        #[test]
        fn default_is_month() {
            assert_eq!(WindowStrategy::default(), WindowStrategy::CalendarMonth);
        }
    }
}
