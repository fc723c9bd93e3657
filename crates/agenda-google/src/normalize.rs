//! RawEvent to AgendaEvent conversion.
//!
//! The normalization rule: prefer timed start/end fields, fall back to
//! whole-day date fields, default missing titles to the fixed placeholder.
//! Upstream ordering is preserved; nothing is reordered or dropped here.

use agenda_core::{AgendaEvent, EventTime};

use crate::raw::{RawEvent, RawEventTime};

/// Converts a [`RawEvent`] to an [`AgendaEvent`].
pub fn normalize_event(raw: &RawEvent) -> AgendaEvent {
    let mut event = AgendaEvent::new(&raw.id, raw.summary.clone());

    if let Some(ref start) = raw.start {
        event = event.with_start(convert_time(start));
    }
    if let Some(ref end) = raw.end {
        event = event.with_end(convert_time(end));
    }
    if let Some(ref location) = raw.location {
        event = event.with_location(location);
    }
    if let Some(ref description) = raw.description {
        event = event.with_description(description);
    }
    if let Some(ref html_link) = raw.html_link {
        event = event.with_detail_url(html_link);
    }

    event
}

/// Converts a list of raw events, preserving upstream order.
pub fn normalize_events(raw: &[RawEvent]) -> Vec<AgendaEvent> {
    raw.iter().map(normalize_event).collect()
}

/// Converts a [`RawEventTime`] to an [`EventTime`].
fn convert_time(raw: &RawEventTime) -> EventTime {
    match raw {
        RawEventTime::DateTime(dt) => EventTime::from_utc(*dt),
        RawEventTime::Date(date) => EventTime::from_date(*date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_core::UNTITLED;
    use chrono::NaiveDate;

    fn sample_datetime() -> chrono::DateTime<chrono::Utc> {
        "2025-02-05T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn normalizes_timed_event() {
        let raw = RawEvent::new("evt-1")
            .with_summary("Team Meeting")
            .with_start(RawEventTime::from_datetime(sample_datetime()))
            .with_end(RawEventTime::from_datetime(sample_datetime()))
            .with_location("Room 101")
            .with_description("Weekly sync")
            .with_html_link("https://calendar.google.com/event/abc");

        let event = normalize_event(&raw);
        assert_eq!(event.id, "evt-1");
        assert_eq!(event.title, "Team Meeting");
        assert!(!event.is_all_day());
        assert_eq!(event.location, Some("Room 101".to_string()));
        assert_eq!(event.description, Some("Weekly sync".to_string()));
        assert_eq!(
            event.detail_url,
            Some("https://calendar.google.com/event/abc".to_string())
        );
    }

    #[test]
    fn normalizes_all_day_event() {
        let raw = RawEvent::new("evt-2").with_start(RawEventTime::from_date(
            NaiveDate::from_ymd_opt(2025, 2, 5).unwrap(),
        ));

        let event = normalize_event(&raw);
        assert!(event.is_all_day());
        assert!(event.end.is_none());
    }

    #[test]
    fn missing_title_becomes_placeholder() {
        let raw = RawEvent::new("evt-3");
        let event = normalize_event(&raw);
        assert_eq!(event.title, UNTITLED);
    }

    #[test]
    fn event_without_times_is_kept_unscheduled() {
        let raw = RawEvent::new("evt-4").with_summary("Someday");
        let event = normalize_event(&raw);
        assert!(event.start.is_none());
        assert_eq!(event.schedule(), agenda_core::Schedule::Unscheduled);
    }

    #[test]
    fn list_preserves_upstream_order() {
        let raws = vec![
            RawEvent::new("c").with_summary("third"),
            RawEvent::new("a").with_summary("first"),
            RawEvent::new("b").with_summary("second"),
        ];

        let events = normalize_events(&raws);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
