//! Presentation formatting for agenda events.
//!
//! Pure functions mapping event records to display strings. Nothing here
//! touches the clock or the network; the caller passes every instant in.

use chrono::{DateTime, Utc};

use crate::event::{AgendaEvent, Schedule};
use crate::time::EventTime;

/// Marker shown in place of a time for all-day events and missing ends.
pub const ALL_DAY_MARKER: &str = "all day";

/// Marker shown for events that carry no start at all.
pub const UNSCHEDULED_MARKER: &str = "unscheduled";

/// Formats an event time as a 24-hour `HH:MM` string.
///
/// All-day times and absent times render the all-day marker.
pub fn format_time(time: Option<&EventTime>) -> String {
    match time.and_then(EventTime::as_datetime) {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => ALL_DAY_MARKER.to_string(),
    }
}

/// Formats an event time as a long date (`February 5, 2025`).
///
/// An absent time renders as the empty string.
pub fn format_date(time: Option<&EventTime>) -> String {
    match time {
        Some(t) => t.date().format("%B %-d, %Y").to_string(),
        None => String::new(),
    }
}

/// Formats the date/time line for an event.
///
/// Timed events render `date start–end`; an end missing upstream renders the
/// all-day marker in the end slot. All-day events render `date (all day)`.
/// Events with no start render the unscheduled marker.
pub fn format_event_line(event: &AgendaEvent) -> String {
    match event.schedule() {
        Schedule::Timed { start, end } => {
            let end_part = match end {
                Some(dt) => dt.format("%H:%M").to_string(),
                None => ALL_DAY_MARKER.to_string(),
            };
            format!(
                "{} {}\u{2013}{}",
                start.format("%B %-d, %Y"),
                start.format("%H:%M"),
                end_part
            )
        }
        Schedule::AllDay(date) => {
            format!("{} ({})", date.format("%B %-d, %Y"), ALL_DAY_MARKER)
        }
        Schedule::Unscheduled => UNSCHEDULED_MARKER.to_string(),
    }
}

/// Formats the header date line (`Wednesday, February 5, 2025`).
pub fn format_header_date(now: DateTime<Utc>) -> String {
    now.format("%A, %B %-d, %Y").to_string()
}
