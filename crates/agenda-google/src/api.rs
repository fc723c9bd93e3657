//! Injection seams for the session controller.
//!
//! The controller never reaches for ambient globals; the identity flow and
//! the events API are explicitly owned dependencies behind these traits, so
//! the state machine is testable without a browser or a network.

use std::future::Future;
use std::pin::Pin;

use agenda_core::{AccessToken, TimeWindow};

use crate::error::ApiResult;
use crate::raw::RawEvent;

/// A boxed future for async trait methods.
///
/// Boxing keeps the traits object-safe so the controller can hold
/// `Arc<dyn IdentityFlow>` / `Arc<dyn EventsApi>` values.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The interactive token-acquisition side of the identity provider.
///
/// Implemented by [`crate::ConsentFlow`]; tests substitute stubs.
pub trait IdentityFlow: Send + Sync {
    /// Runs the interactive consent flow and resolves with an access token.
    ///
    /// The flow is user-interactive (browser consent); completion arrives
    /// exactly once, as success or failure.
    fn request_token(&self) -> BoxFuture<'_, ApiResult<AccessToken>>;

    /// Revokes a previously issued token with the provider.
    fn revoke_token<'a>(&'a self, token: &'a AccessToken) -> BoxFuture<'a, ApiResult<()>>;
}

/// The calendar query side of the upstream API.
///
/// Implemented by [`crate::CalendarClient`]; tests substitute stubs.
pub trait EventsApi: Send + Sync {
    /// Lists events in the given window, in upstream order.
    fn list_events<'a>(
        &'a self,
        token: &'a AccessToken,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ApiResult<Vec<RawEvent>>>;
}
