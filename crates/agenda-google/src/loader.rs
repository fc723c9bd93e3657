//! Once-only loading of remote bootstrap resources.
//!
//! Before the client can talk to Google it needs two remote resources: the
//! Calendar discovery document and the identity services metadata. Each must
//! be fetched at most once per process, no matter how many call sites ask
//! for it or how they interleave. [`ResourceLoader::ensure`] is that
//! guarantee: idempotency is keyed by exact URL string match.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::api::BoxFuture;
use crate::error::{ApiError, ApiResult};

/// The fetch behind the loader.
///
/// A trait seam so the loader is testable without a network.
pub trait ResourceFetcher: Send + Sync {
    /// Fetches the resource at `url`, discarding the body.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ApiResult<()>>;
}

/// Fetches resources over HTTPS.
#[derive(Debug)]
pub struct HttpResourceFetcher {
    http_client: reqwest::Client,
}

impl HttpResourceFetcher {
    /// Creates a new fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal("failed to create HTTP client").with_source(e))?;
        Ok(Self { http_client })
    }
}

impl ResourceFetcher for HttpResourceFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            let response = self
                .http_client
                .get(url)
                .send()
                .await
                .map_err(|e| ApiError::script_load(format!("failed to load {}: {}", url, e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ApiError::script_load(format!(
                    "failed to load {}: HTTP {}",
                    url, status
                )));
            }

            debug!("loaded resource {}", url);
            Ok(())
        })
    }
}

/// Loads each bootstrap resource exactly once.
///
/// A second `ensure` for a URL that is loading or loaded performs no second
/// fetch; concurrent callers await the same in-flight fetch. A failed fetch
/// leaves the slot empty so a later `ensure` may try again (nothing retries
/// automatically).
pub struct ResourceLoader {
    fetcher: Arc<dyn ResourceFetcher>,
    cells: Mutex<HashMap<String, Arc<OnceCell<()>>>>,
}

impl ResourceLoader {
    /// Creates a loader over the given fetcher.
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Ensures the resource at `url` has been fetched.
    ///
    /// Resolves immediately when it already has; otherwise fetches it and
    /// resolves on completion.
    pub async fn ensure(&self, url: &str) -> ApiResult<()> {
        let cell = {
            let mut cells = self.cells.lock().unwrap();
            cells.entry(url.to_string()).or_default().clone()
        };

        if cell.initialized() {
            debug!("resource {} already loaded", url);
            return Ok(());
        }

        cell.get_or_try_init(|| self.fetcher.fetch(url))
            .await
            .map(|_| ())
    }

    /// Returns true if the resource at `url` has been loaded.
    pub fn is_loaded(&self, url: &str) -> bool {
        self.cells
            .lock()
            .unwrap()
            .get(url)
            .is_some_and(|cell| cell.initialized())
    }

    /// Returns the number of loaded resources.
    pub fn loaded_count(&self) -> usize {
        self.cells
            .lock()
            .unwrap()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }
}
