//! Session and fetch state.
//!
//! [`Session`] is the local record of whether the user is authenticated and
//! holds a usable access token. [`FetchState`] is the finite-state
//! representation of the latest event-retrieval attempt's outcome. Both are
//! single shared values with exactly one writer path (the session
//! controller); views only read snapshots.

use std::fmt;

use crate::event::AgendaEvent;

/// An opaque OAuth access token.
///
/// The token value is never included in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value, for use in request headers.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// The local authentication session.
///
/// Holding a token and being signed in are the same thing by construction,
/// so the two can never disagree.
#[derive(Debug, Default)]
pub struct Session {
    token: Option<AccessToken>,
}

impl Session {
    /// Creates a new, signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a token is held.
    pub fn signed_in(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the held token, if any.
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Stores a freshly issued token, signing the session in.
    pub fn sign_in(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    /// Clears the held token, returning it so the caller can revoke it.
    ///
    /// Returns `None` when no token was held (sign-out is then a no-op).
    pub fn sign_out(&mut self) -> Option<AccessToken> {
        self.token.take()
    }
}

/// The outcome of the latest event-retrieval attempt.
///
/// Exactly one variant holds at any time; a fetch sets `Loading` before the
/// request and `Success` or `Error` after, in every path.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState {
    /// No fetch has run yet (or the session was signed out).
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch succeeded; the list replaces any previous one
    /// wholesale. An empty list is a valid success.
    Success(Vec<AgendaEvent>),
    /// The last fetch failed, with a human-readable message.
    Error(String),
}

impl FetchState {
    /// Returns `true` while a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the fetched events, if the last fetch succeeded.
    pub fn events(&self) -> Option<&[AgendaEvent]> {
        match self {
            Self::Success(events) => Some(events),
            _ => None,
        }
    }

    /// Returns the error message, if the last fetch failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_starts_signed_out() {
        let session = Session::new();
        assert!(!session.signed_in());
        assert!(session.token().is_none());
    }

    #[test]
    fn sign_in_holds_token() {
        let mut session = Session::new();
        session.sign_in(AccessToken::new("ya29.token"));
        assert!(session.signed_in());
        assert_eq!(session.token().unwrap().secret(), "ya29.token");
    }

    #[test]
    fn sign_out_returns_token_once() {
        let mut session = Session::new();
        session.sign_in(AccessToken::new("ya29.token"));

        let taken = session.sign_out();
        assert_eq!(taken, Some(AccessToken::new("ya29.token")));
        assert!(!session.signed_in());

        // A second sign-out has nothing to return.
        assert!(session.sign_out().is_none());
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = AccessToken::new("ya29.super-secret");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn fetch_state_accessors() {
        assert!(FetchState::Loading.is_loading());
        assert!(!FetchState::Idle.is_loading());

        let success = FetchState::Success(vec![]);
        assert_eq!(success.events(), Some(&[][..]));
        assert!(success.error_message().is_none());

        let error = FetchState::Error("boom".to_string());
        assert_eq!(error.error_message(), Some("boom"));
        assert!(error.events().is_none());
    }

    #[test]
    fn empty_success_is_not_an_error() {
        let state = FetchState::Success(vec![]);
        assert!(state.events().is_some());
        assert!(state.error_message().is_none());
    }
}
