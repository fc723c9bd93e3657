//! Google identity and Calendar API access.
//!
//! This crate owns everything that talks to Google: the once-only bootstrap
//! resource loader, the interactive OAuth consent flow (and token
//! revocation), the Calendar API v3 events query with its error
//! classification, and the conversion from raw API items to
//! [`agenda_core::AgendaEvent`] records.

pub mod api;
pub mod client;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod oauth;
pub mod raw;

pub use api::{BoxFuture, EventsApi, IdentityFlow};
pub use client::CalendarClient;
pub use error::{ApiError, ApiErrorCode, ApiResult};
pub use loader::{HttpResourceFetcher, ResourceFetcher, ResourceLoader};
pub use normalize::{normalize_event, normalize_events};
pub use oauth::{ConsentFlow, OAuthCredentials};
pub use raw::{RawEvent, RawEventTime};

/// Discovery document describing the Calendar API v3 surface.
pub const DISCOVERY_DOC_URL: &str =
    "https://www.googleapis.com/discovery/v1/apis/calendar/v3/rest";

/// Identity services metadata required before a consent flow can run.
pub const IDENTITY_SERVICES_URL: &str = "https://accounts.google.com/gsi/client";

/// Read-only calendar scope requested at sign-in.
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
