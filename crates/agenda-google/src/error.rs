//! Error types for Google API operations.
//!
//! Every failure that can reach the view is classified by [`ApiErrorCode`]
//! and carried as a single [`ApiError`] with a human-readable message. The
//! view only ever shows the message string; the code drives how the session
//! reacts (a 401 invalidates it, a 403 does not).

use std::fmt;
use thiserror::Error;

/// The category of an API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorCode {
    /// A bootstrap resource failed to load. Fatal to initialization; no
    /// automatic retry.
    ScriptLoad,
    /// The consent flow failed or was denied/cancelled by the user.
    Auth,
    /// The API rejected the request with 403; the session stays valid.
    PermissionDenied,
    /// The API rejected the token with 401; the session must be invalidated.
    AuthExpired,
    /// Any other fetch failure, carrying the upstream message when available.
    Fetch,
    /// Connection failed, timed out, or DNS did not resolve.
    Network,
    /// The server response could not be parsed.
    InvalidResponse,
    /// Missing or invalid configuration.
    Configuration,
    /// Unexpected internal state.
    Internal,
}

impl ApiErrorCode {
    /// Returns true if the user can recover by simply retrying the action
    /// (signing in or refreshing again).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Auth | Self::AuthExpired | Self::Fetch | Self::Network)
    }

    /// Returns true if this error means the held token is no longer usable.
    pub fn invalidates_session(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Returns a stable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScriptLoad => "script_load",
            Self::Auth => "auth",
            Self::PermissionDenied => "permission_denied",
            Self::AuthExpired => "auth_expired",
            Self::Fetch => "fetch",
            Self::Network => "network",
            Self::InvalidResponse => "invalid_response",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from a Google identity or Calendar API operation.
#[derive(Debug, Error)]
pub struct ApiError {
    /// The error code categorizing this error.
    code: ApiErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ApiError {
    /// Creates a new error with the given code and message.
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a bootstrap resource loading error.
    pub fn script_load(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::ScriptLoad, message)
    }

    /// Creates a consent flow error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Auth, message)
    }

    /// Creates a permission (403) error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::PermissionDenied, message)
    }

    /// Creates an expired-authorization (401) error.
    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::AuthExpired, message)
    }

    /// Creates a generic fetch error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Fetch, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Network, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Configuration, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Internal, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ApiErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_classification() {
        assert!(ApiErrorCode::Auth.is_recoverable());
        assert!(ApiErrorCode::Fetch.is_recoverable());
        assert!(!ApiErrorCode::PermissionDenied.is_recoverable());
        assert!(!ApiErrorCode::ScriptLoad.is_recoverable());

        assert!(ApiErrorCode::AuthExpired.invalidates_session());
        assert!(!ApiErrorCode::PermissionDenied.invalidates_session());
    }

    #[test]
    fn code_names() {
        assert_eq!(ApiErrorCode::ScriptLoad.as_str(), "script_load");
        assert_eq!(ApiErrorCode::AuthExpired.as_str(), "auth_expired");
    }

    #[test]
    fn error_creation() {
        let err = ApiError::permission_denied("calendar access denied");
        assert_eq!(err.code(), ApiErrorCode::PermissionDenied);
        assert_eq!(err.message(), "calendar access denied");
    }

    #[test]
    fn error_display() {
        let err = ApiError::auth_expired("token rejected");
        let display = format!("{}", err);
        assert!(display.contains("auth_expired"));
        assert!(display.contains("token rejected"));
    }

    #[test]
    fn error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection reset");
        let err = ApiError::network("request failed").with_source(io_err);
        assert!(err.source().is_some());
    }
}
