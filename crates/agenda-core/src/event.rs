//! The normalized calendar event type.
//!
//! [`AgendaEvent`] is the canonical representation of an event after fetching
//! and normalization. Events are immutable once constructed; a fetch replaces
//! the whole list rather than patching it.

use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// Title used when the upstream event has no usable summary.
pub const UNTITLED: &str = "(untitled)";

/// A normalized calendar event.
///
/// The upstream API distinguishes timed events (`start.dateTime`) from
/// all-day events (`start.date`); both collapse into [`EventTime`] here.
/// Events that carry neither are kept and render as unscheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaEvent {
    /// Unique identifier for the event (provider-specific).
    pub id: String,
    /// The event title, defaulted to [`UNTITLED`] when absent or blank.
    pub title: String,
    /// When the event starts, if scheduled.
    pub start: Option<EventTime>,
    /// When the event ends, if known.
    pub end: Option<EventTime>,
    /// The event location.
    pub location: Option<String>,
    /// The event description.
    pub description: Option<String>,
    /// URL to view this event in the calendar UI.
    pub detail_url: Option<String>,
}

/// The schedule shape of an event, as derived from its start/end fields.
///
/// This is what the presentation layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule<'a> {
    /// A timed event; the end may be missing upstream.
    Timed {
        start: &'a chrono::DateTime<chrono::Utc>,
        end: Option<&'a chrono::DateTime<chrono::Utc>>,
    },
    /// A whole-day event.
    AllDay(&'a chrono::NaiveDate),
    /// The event carries no start at all.
    Unscheduled,
}

impl AgendaEvent {
    /// Creates a new event, applying the untitled placeholder when the
    /// summary is absent or blank.
    pub fn new(id: impl Into<String>, title: Option<String>) -> Self {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        Self {
            id: id.into(),
            title,
            start: None,
            end: None,
            location: None,
            description: None,
            detail_url: None,
        }
    }

    /// Returns `true` if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.as_ref().is_some_and(EventTime::is_all_day)
    }

    /// Returns the schedule shape of this event.
    ///
    /// A timed start wins over a date-only one by construction; an event
    /// with no start is unscheduled regardless of its end.
    pub fn schedule(&self) -> Schedule<'_> {
        match &self.start {
            Some(EventTime::DateTime(start)) => Schedule::Timed {
                start,
                end: self.end.as_ref().and_then(EventTime::as_datetime),
            },
            Some(EventTime::AllDay(date)) => Schedule::AllDay(date),
            None => Schedule::Unscheduled,
        }
    }

    /// Builder method to set the start time.
    pub fn with_start(mut self, start: EventTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set the end time.
    pub fn with_end(mut self, end: EventTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the detail URL.
    pub fn with_detail_url(mut self, url: impl Into<String>) -> Self {
        self.detail_url = Some(url.into());
        self
    }
}
