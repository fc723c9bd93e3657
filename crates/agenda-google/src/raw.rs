//! Raw event type from the Calendar API.
//!
//! [`RawEvent`] preserves the upstream fields as they arrive, before
//! normalization into [`agenda_core::AgendaEvent`]. The API distinguishes
//! timed fields (`start.dateTime`) from whole-day fields (`start.date`);
//! [`RawEventTime`] keeps that split intact.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The time specification for a raw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific datetime in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date (no specific time).
    Date(NaiveDate),
}

impl RawEventTime {
    /// Creates a RawEventTime from a UTC datetime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a RawEventTime from a date (all-day event).
    pub fn from_date(date: NaiveDate) -> Self {
        Self::Date(date)
    }

    /// Returns true if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// A raw calendar event as returned by the events query.
///
/// All fields other than `id` are optional upstream. Events with no start at
/// all are kept; the presentation layer renders them as unscheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Unique identifier for the event.
    pub id: String,

    /// The event title/summary.
    pub summary: Option<String>,

    /// When the event starts.
    pub start: Option<RawEventTime>,

    /// When the event ends.
    pub end: Option<RawEventTime>,

    /// The event location.
    pub location: Option<String>,

    /// The event description.
    pub description: Option<String>,

    /// A direct link to view this event in the calendar UI.
    pub html_link: Option<String>,
}

impl RawEvent {
    /// Creates a new raw event with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: None,
            start: None,
            end: None,
            location: None,
            description: None,
            html_link: None,
        }
    }

    /// Returns true if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.as_ref().is_some_and(RawEventTime::is_all_day)
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the start time.
    pub fn with_start(mut self, start: RawEventTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set the end time.
    pub fn with_end(mut self, end: RawEventTime) -> Self {
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

    /// Builder method to set the HTML link.
    pub fn with_html_link(mut self, html_link: impl Into<String>) -> Self {
        self.html_link = Some(html_link.into());
        self
    }
}
