//! Terminal rendering of the controller state.
//!
//! A pure function over a [`ViewModel`] snapshot: the same snapshot always
//! renders the same text. Branching follows the widget states, in order:
//! error banner, signed-out prompt, loading, empty window, event list.

use chrono::{DateTime, Utc};

use agenda_core::{FetchState, format_event_line, format_header_date};

use crate::controller::ViewModel;

/// Renders the view for the given snapshot.
pub fn render(view: &ViewModel, now: DateTime<Utc>, no_events_text: &str) -> String {
    let mut out = String::new();
    out.push_str("Agenda\n");
    out.push_str(&format_header_date(now));
    out.push_str("\n\n");

    if let Some(ref error) = view.error {
        out.push_str(&format!("! {}\n", error));
    }

    if !view.signed_in {
        if view.error.is_none() {
            out.push_str("Connect your Google Calendar\n");
            out.push_str("Sign in to list your upcoming events.\n");
        }
        return out;
    }

    match &view.fetch {
        FetchState::Loading => {
            out.push_str("Loading events...\n");
        }
        FetchState::Success(events) if events.is_empty() => {
            out.push_str(no_events_text);
            out.push('\n');
        }
        FetchState::Success(events) => {
            let label = if events.len() == 1 { "event" } else { "events" };
            out.push_str(&format!("{} {}\n\n", events.len(), label));

            for event in events {
                out.push_str(&format!("* {}\n", event.title));
                out.push_str(&format!("  {}\n", format_event_line(event)));
                if let Some(ref location) = event.location {
                    out.push_str(&format!("  at {}\n", location));
                }
                if let Some(ref description) = event.description {
                    out.push_str(&format!("  {}\n", description));
                }
                if let Some(ref url) = event.detail_url {
                    out.push_str(&format!("  {}\n", url));
                }
                out.push('\n');
            }
        }
        // Idle renders nothing; a fetch error is already in the banner.
        FetchState::Idle | FetchState::Error(_) => {}
    }

    out
}
