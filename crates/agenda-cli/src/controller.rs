//! The session controller.
//!
//! Owns the [`Session`] and [`FetchState`] values and is their only writer;
//! the view only reads snapshots. The identity flow, the events API and the
//! resource loader are injected dependencies, so the whole state machine
//! runs under test with stubs.
//!
//! Concurrent refreshes are not queued or cancelled. Each fetch takes a
//! generation number and a completion only writes state while its
//! generation is still the latest, so a stale response can never overwrite
//! a newer one.

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use tracing::{debug, info, warn};

use agenda_core::{FetchState, Session, WindowStrategy};
use agenda_google::{
    ApiError, ApiErrorCode, DISCOVERY_DOC_URL, EventsApi, IDENTITY_SERVICES_URL, IdentityFlow,
    ResourceLoader, normalize_events,
};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No token held.
    Unauthenticated,
    /// A consent flow is in flight.
    Authenticating,
    /// A token is held.
    Authenticated,
}

/// A read-only snapshot of controller state for rendering.
#[derive(Debug, Clone)]
pub struct ViewModel {
    /// Whether the session holds a token.
    pub signed_in: bool,
    /// The latest fetch outcome.
    pub fetch: FetchState,
    /// The banner error string, if any. Initialization and sign-in errors
    /// take precedence over a fetch error.
    pub error: Option<String>,
}

/// Drives sign-in, sign-out and event fetching.
pub struct SessionController {
    identity: Arc<dyn IdentityFlow>,
    events: Arc<dyn EventsApi>,
    loader: Arc<ResourceLoader>,
    window: WindowStrategy,
    session: RwLock<Session>,
    fetch_state: RwLock<FetchState>,
    error: RwLock<Option<String>>,
    authenticating: AtomicBool,
    fetch_seq: AtomicU64,
}

impl SessionController {
    /// Creates a controller over the given dependencies.
    pub fn new(
        identity: Arc<dyn IdentityFlow>,
        events: Arc<dyn EventsApi>,
        loader: Arc<ResourceLoader>,
        window: WindowStrategy,
    ) -> Self {
        Self {
            identity,
            events,
            loader,
            window,
            session: RwLock::new(Session::new()),
            fetch_state: RwLock::new(FetchState::Idle),
            error: RwLock::new(None),
            authenticating: AtomicBool::new(false),
            fetch_seq: AtomicU64::new(0),
        }
    }

    /// Loads the remote bootstrap resources, once.
    ///
    /// A failure lands in the view's error banner; the controller stays
    /// usable and a later call may try again.
    pub async fn initialize(&self) {
        for url in [DISCOVERY_DOC_URL, IDENTITY_SERVICES_URL] {
            if let Err(e) = self.loader.ensure(url).await {
                warn!("initialization failed: {}", e);
                *self.error.write().unwrap() = Some(format!(
                    "failed to initialize Google services: {}",
                    e.message()
                ));
                return;
            }
        }
        debug!("Google services initialized");
    }

    /// Runs the interactive sign-in and, on success, immediately fetches.
    ///
    /// Fails fast when the identity resources were never loaded instead of
    /// calling into a missing dependency. Returns whether a token was
    /// obtained.
    pub async fn sign_in(&self) -> bool {
        if !self.loader.is_loaded(IDENTITY_SERVICES_URL) {
            warn!("sign-in attempted before identity services were loaded");
            *self.error.write().unwrap() =
                Some("identity services are not loaded; cannot sign in".to_string());
            return false;
        }

        self.authenticating.store(true, Ordering::SeqCst);
        let result = self.identity.request_token().await;
        self.authenticating.store(false, Ordering::SeqCst);

        match result {
            Ok(token) => {
                info!("sign-in successful");
                self.session.write().unwrap().sign_in(token);
                *self.error.write().unwrap() = None;
                self.refresh().await;
                true
            }
            Err(e) => {
                warn!("sign-in failed: {}", e);
                *self.error.write().unwrap() = Some(format!("sign-in failed: {}", e.message()));
                false
            }
        }
    }

    /// Revokes and clears the held token and drops the event list.
    ///
    /// A no-op when no token is held: no revoke call is issued and state is
    /// untouched.
    pub async fn sign_out(&self) {
        let token = self.session.write().unwrap().sign_out();
        let Some(token) = token else {
            debug!("sign-out without a token is a no-op");
            return;
        };

        if let Err(e) = self.identity.revoke_token(&token).await {
            // Signed out locally either way.
            warn!("token revocation failed: {}", e);
        }

        *self.fetch_state.write().unwrap() = FetchState::Idle;
        *self.error.write().unwrap() = None;
        info!("signed out");
    }

    /// Fetches events for the configured window.
    ///
    /// Loading is set before the request and a terminal state after it, in
    /// every path of the current generation; a superseded fetch drops its
    /// result without touching state.
    pub async fn refresh(&self) {
        let token = {
            let session = self.session.read().unwrap();
            session.token().cloned()
        };
        let Some(token) = token else {
            *self.error.write().unwrap() = Some("sign in to fetch events".to_string());
            return;
        };

        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        *self.fetch_state.write().unwrap() = FetchState::Loading;
        *self.error.write().unwrap() = None;

        let window = self.window.window_at(Utc::now());
        debug!("fetching events in {:?}", window);
        let result = self.events.list_events(&token, &window).await;

        if self.fetch_seq.load(Ordering::SeqCst) != seq {
            debug!("dropping stale fetch result (generation {})", seq);
            return;
        }

        match result {
            Ok(raw) => {
                debug!("fetched {} events", raw.len());
                *self.fetch_state.write().unwrap() = FetchState::Success(normalize_events(&raw));
            }
            Err(e) => self.apply_fetch_error(e),
        }
    }

    /// Maps a fetch failure onto session and view state.
    fn apply_fetch_error(&self, error: ApiError) {
        warn!("fetch failed: {}", error);
        let message = match error.code() {
            // 403: the session stays valid, the message goes out verbatim.
            ApiErrorCode::PermissionDenied => error.message().to_string(),
            // 401: the token is already unusable upstream, so clear it
            // locally without a revoke call.
            ApiErrorCode::AuthExpired => {
                self.session.write().unwrap().sign_out();
                "authorization expired, please sign in again".to_string()
            }
            _ => format!("failed to fetch events: {}", error.message()),
        };
        *self.fetch_state.write().unwrap() = FetchState::Error(message);
    }

    /// Returns the current session phase.
    pub fn phase(&self) -> SessionPhase {
        if self.authenticating.load(Ordering::SeqCst) {
            SessionPhase::Authenticating
        } else if self.session.read().unwrap().signed_in() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Unauthenticated
        }
    }

    /// Returns whether the session holds a token.
    pub fn signed_in(&self) -> bool {
        self.session.read().unwrap().signed_in()
    }

    /// Takes a read-only snapshot for rendering.
    pub fn snapshot(&self) -> ViewModel {
        let fetch = self.fetch_state.read().unwrap().clone();
        let error = self
            .error
            .read()
            .unwrap()
            .clone()
            .or_else(|| fetch.error_message().map(str::to_string));
        ViewModel {
            signed_in: self.signed_in(),
            fetch,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use agenda_core::AccessToken;
    use agenda_google::{ApiResult, BoxFuture, RawEvent, RawEventTime, ResourceFetcher};

    /// Identity stub: pops queued results, falling back to success.
    struct StubIdentity {
        results: Mutex<VecDeque<ApiResult<AccessToken>>>,
        requests: AtomicUsize,
        revocations: AtomicUsize,
    }

    impl StubIdentity {
        fn ok() -> Self {
            Self {
                results: Mutex::new(VecDeque::new()),
                requests: AtomicUsize::new(0),
                revocations: AtomicUsize::new(0),
            }
        }

        fn denying(message: &str) -> Self {
            let stub = Self::ok();
            stub.results
                .lock()
                .unwrap()
                .push_back(Err(ApiError::auth(message)));
            stub
        }

        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }

        fn revocations(&self) -> usize {
            self.revocations.load(Ordering::SeqCst)
        }
    }

    impl IdentityFlow for StubIdentity {
        fn request_token(&self) -> BoxFuture<'_, ApiResult<AccessToken>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let next = self.results.lock().unwrap().pop_front();
            Box::pin(async move { next.unwrap_or_else(|| Ok(AccessToken::new("stub-token"))) })
        }

        fn revoke_token<'a>(&'a self, _token: &'a AccessToken) -> BoxFuture<'a, ApiResult<()>> {
            self.revocations.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        }
    }

    /// Events stub: pops queued (delay, result) pairs, falling back to an
    /// empty success.
    struct StubEvents {
        responses: Mutex<VecDeque<(Option<Duration>, ApiResult<Vec<RawEvent>>)>>,
        calls: AtomicUsize,
    }

    impl StubEvents {
        fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn push(&self, delay: Option<Duration>, result: ApiResult<Vec<RawEvent>>) {
            self.responses.lock().unwrap().push_back((delay, result));
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EventsApi for StubEvents {
        fn list_events<'a>(
            &'a self,
            _token: &'a AccessToken,
            _window: &'a agenda_core::TimeWindow,
        ) -> BoxFuture<'a, ApiResult<Vec<RawEvent>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front();
            Box::pin(async move {
                match next {
                    Some((delay, result)) => {
                        if let Some(delay) = delay {
                            tokio::time::sleep(delay).await;
                        }
                        result
                    }
                    None => Ok(vec![]),
                }
            })
        }
    }

    /// Fetcher stub that always succeeds.
    struct OkFetcher;

    impl ResourceFetcher for OkFetcher {
        fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, ApiResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    /// Fetcher stub that always fails.
    struct FailingFetcher;

    impl ResourceFetcher for FailingFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ApiResult<()>> {
            let url = url.to_string();
            Box::pin(async move { Err(ApiError::script_load(format!("failed to load {}", url))) })
        }
    }

    fn controller_with(
        identity: Arc<StubIdentity>,
        events: Arc<StubEvents>,
    ) -> SessionController {
        SessionController::new(
            identity,
            events,
            Arc::new(ResourceLoader::new(Arc::new(OkFetcher))),
            WindowStrategy::CalendarMonth,
        )
    }

    fn timed_event(id: &str) -> RawEvent {
        RawEvent::new(id)
            .with_summary(id)
            .with_start(RawEventTime::from_datetime(
                "2025-02-05T10:00:00Z".parse().unwrap(),
            ))
    }

    #[tokio::test]
    async fn sign_in_success_triggers_fetch() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        events.push(None, Ok(vec![timed_event("evt-1")]));

        let controller = controller_with(identity.clone(), events.clone());
        controller.initialize().await;

        assert!(controller.sign_in().await);
        assert_eq!(controller.phase(), SessionPhase::Authenticated);
        assert_eq!(events.calls(), 1);

        let snapshot = controller.snapshot();
        assert!(snapshot.signed_in);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.fetch.events().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sign_in_failure_stays_unauthenticated() {
        let identity = Arc::new(StubIdentity::denying("access_denied"));
        let events = Arc::new(StubEvents::new());

        let controller = controller_with(identity, events.clone());
        controller.initialize().await;

        assert!(!controller.sign_in().await);
        assert_eq!(controller.phase(), SessionPhase::Unauthenticated);
        assert_eq!(events.calls(), 0);

        let snapshot = controller.snapshot();
        assert!(!snapshot.signed_in);
        assert!(snapshot.error.unwrap().contains("sign-in failed"));
    }

    #[tokio::test]
    async fn sign_in_fails_fast_when_identity_not_loaded() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());

        // No initialize() call: the identity resources were never loaded.
        let controller = controller_with(identity.clone(), events);

        assert!(!controller.sign_in().await);
        assert_eq!(identity.requests(), 0);
        assert!(controller
            .snapshot()
            .error
            .unwrap()
            .contains("identity services are not loaded"));
    }

    #[tokio::test]
    async fn initialize_failure_lands_in_error_banner() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        let controller = SessionController::new(
            identity,
            events,
            Arc::new(ResourceLoader::new(Arc::new(FailingFetcher))),
            WindowStrategy::CalendarMonth,
        );

        controller.initialize().await;
        assert!(controller
            .snapshot()
            .error
            .unwrap()
            .contains("failed to initialize Google services"));
    }

    #[tokio::test]
    async fn fetch_401_clears_session() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        events.push(None, Err(ApiError::auth_expired("token rejected")));

        let controller = controller_with(identity.clone(), events);
        controller.initialize().await;
        controller.sign_in().await;

        assert!(!controller.signed_in());
        let snapshot = controller.snapshot();
        assert!(snapshot.error.unwrap().contains("authorization expired"));
        assert!(snapshot.fetch.events().is_none());
        // The dead token is cleared locally, never revoked.
        assert_eq!(identity.revocations(), 0);
    }

    #[tokio::test]
    async fn fetch_403_keeps_session() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        events.push(
            None,
            Err(ApiError::permission_denied("Calendar API access denied")),
        );

        let controller = controller_with(identity, events);
        controller.initialize().await;
        controller.sign_in().await;

        assert!(controller.signed_in());
        assert!(controller
            .snapshot()
            .error
            .unwrap()
            .contains("Calendar API access denied"));
    }

    #[tokio::test]
    async fn generic_fetch_error_carries_upstream_message() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        events.push(None, Err(ApiError::fetch("Bad Request: invalid timeMin")));

        let controller = controller_with(identity, events);
        controller.initialize().await;
        controller.sign_in().await;

        assert!(controller.signed_in());
        let error = controller.snapshot().error.unwrap();
        assert!(error.contains("failed to fetch events"));
        assert!(error.contains("Bad Request: invalid timeMin"));
    }

    #[tokio::test]
    async fn fetch_of_zero_events_is_success() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        events.push(None, Ok(vec![]));

        let controller = controller_with(identity, events);
        controller.initialize().await;
        controller.sign_in().await;

        let snapshot = controller.snapshot();
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.fetch.events(), Some(&[][..]));
    }

    #[tokio::test]
    async fn refresh_without_session_does_not_call_api() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());

        let controller = controller_with(identity, events.clone());
        controller.refresh().await;

        assert_eq!(events.calls(), 0);
        assert!(controller.snapshot().error.unwrap().contains("sign in"));
    }

    #[tokio::test]
    async fn sign_out_revokes_and_clears() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        events.push(None, Ok(vec![timed_event("evt-1")]));

        let controller = controller_with(identity.clone(), events);
        controller.initialize().await;
        controller.sign_in().await;
        assert!(controller.signed_in());

        controller.sign_out().await;
        assert!(!controller.signed_in());
        assert_eq!(identity.revocations(), 1);
        assert_eq!(controller.snapshot().fetch, FetchState::Idle);
    }

    #[tokio::test]
    async fn sign_out_without_token_is_a_noop() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());

        let controller = controller_with(identity.clone(), events);
        controller.sign_out().await;

        assert_eq!(identity.revocations(), 0);
        assert_eq!(controller.snapshot().fetch, FetchState::Idle);
    }

    #[tokio::test]
    async fn loading_is_observable_while_fetch_is_in_flight() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        events.push(None, Ok(vec![])); // consumed by the sign-in fetch
        events.push(Some(Duration::from_millis(100)), Ok(vec![]));

        let controller = Arc::new(controller_with(identity, events));
        controller.initialize().await;
        controller.sign_in().await;

        let background = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(controller.snapshot().fetch.is_loading());

        background.await.unwrap();
        assert!(!controller.snapshot().fetch.is_loading());
    }

    #[tokio::test]
    async fn stale_fetch_result_is_dropped() {
        let identity = Arc::new(StubIdentity::ok());
        let events = Arc::new(StubEvents::new());
        events.push(None, Ok(vec![])); // consumed by the sign-in fetch
        events.push(
            Some(Duration::from_millis(100)),
            Ok(vec![timed_event("stale")]),
        );
        events.push(None, Ok(vec![timed_event("fresh")]));

        let controller = Arc::new(controller_with(identity, events));
        controller.initialize().await;
        controller.sign_in().await;

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        // Let the slow fetch take its generation before starting the fast one.
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.refresh().await;
        slow.await.unwrap();

        let snapshot = controller.snapshot();
        let fetched = snapshot.fetch.events().unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, "fresh");
    }
}
