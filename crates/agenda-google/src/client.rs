//! Google Calendar API client.
//!
//! A thin HTTP client for the Calendar API v3 events query: request
//! building, response parsing, and status-code classification. One query per
//! fetch, recurring events expanded, ascending by start time, capped at 100
//! results; pagination past the first page is deliberately not supported.

use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use agenda_core::{AccessToken, TimeWindow};

use crate::api::{BoxFuture, EventsApi};
use crate::error::{ApiError, ApiResult};
use crate::raw::{RawEvent, RawEventTime};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Result count cap for the single events query.
const MAX_RESULTS: usize = 100;

/// Google Calendar API client.
///
/// The client holds no token; the caller passes the session's token with
/// each query, so the session stays the single owner of credentials.
#[derive(Debug)]
pub struct CalendarClient {
    http_client: reqwest::Client,
    calendar_id: String,
}

impl CalendarClient {
    /// Creates a new client for the primary calendar.
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            calendar_id: "primary".to_string(),
        })
    }

    /// Lists events in the given window.
    ///
    /// Issues a single query with recurring events expanded
    /// (`singleEvents=true`), sorted ascending by start time, capped at
    /// [`MAX_RESULTS`]. The returned order is the upstream order.
    ///
    /// # Errors
    ///
    /// - HTTP 403 maps to `PermissionDenied`
    /// - HTTP 401 maps to `AuthExpired`
    /// - any other failure maps to `Fetch` with the upstream `error.message`
    ///   when the body carries one
    pub async fn events_in_window(
        &self,
        token: &AccessToken,
        window: &TimeWindow,
    ) -> ApiResult<Vec<RawEvent>> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(&self.calendar_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token.secret())
            .query(&[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", MAX_RESULTS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::network("request timeout")
                } else if e.is_connect() {
                    ApiError::network(format!("connection failed: {}", e))
                } else {
                    ApiError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::auth_expired("access token expired or invalid"));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::permission_denied(
                "access to the Calendar API was denied; make sure the API is enabled for this project",
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = extract_error_message(&body)
                .unwrap_or_else(|| format!("API error ({})", status));
            return Err(ApiError::fetch(message));
        }

        let list_response: EventListResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::invalid_response(format!("failed to parse response: {}", e)))?;

        let events: Vec<RawEvent> = list_response
            .items
            .into_iter()
            .filter_map(convert_event)
            .collect();

        debug!("fetched {} events from calendar {}", events.len(), self.calendar_id);
        Ok(events)
    }
}

impl EventsApi for CalendarClient {
    fn list_events<'a>(
        &'a self,
        token: &'a AccessToken,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ApiResult<Vec<RawEvent>>> {
        Box::pin(async move { self.events_in_window(token, window).await })
    }
}

/// Pulls `error.message` out of an API error body, if present.
fn extract_error_message(body: &str) -> Option<String> {
    let parsed: ErrorResponse = serde_json::from_str(body).ok()?;
    let message = parsed.error?.message?;
    if message.is_empty() { None } else { Some(message) }
}

/// Converts an API event to a [`RawEvent`].
///
/// Items without an id are dropped. Items with an unparseable or missing
/// time keep going with that field absent; the presentation layer handles
/// unscheduled events.
fn convert_event(event: ApiEvent) -> Option<RawEvent> {
    let id = match event.id {
        Some(id) => id,
        None => {
            warn!("skipping event without id");
            return None;
        }
    };

    let mut raw = RawEvent::new(id);
    raw.summary = event.summary;
    raw.location = event.location;
    raw.description = event.description;
    raw.html_link = event.html_link;
    raw.start = event.start.and_then(convert_time);
    raw.end = event.end.and_then(convert_time);

    Some(raw)
}

/// Converts an API event time, preferring the timed field over the
/// whole-day one.
fn convert_time(time: ApiEventTime) -> Option<RawEventTime> {
    if let Some(dt) = time.date_time {
        match DateTime::parse_from_rfc3339(&dt) {
            Ok(parsed) => return Some(RawEventTime::DateTime(parsed.to_utc())),
            Err(e) => {
                warn!("failed to parse event time {:?}: {}", dt, e);
                return None;
            }
        }
    }

    if let Some(date) = time.date {
        match chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
            Ok(parsed) => return Some(RawEventTime::Date(parsed)),
            Err(e) => {
                warn!("failed to parse event date {:?}: {}", date, e);
                return None;
            }
        }
    }

    None
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

/// A single event from the Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    html_link: Option<String>,
}

/// Event time from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

/// Error body returned by the API on failure.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}
