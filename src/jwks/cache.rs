//! Cached key set for one provider endpoint
//!
//! # Cache Strategy
//!
//! - **Keying**: snapshots are stored under the key set URL
//! - **TTL**: whole-snapshot expiry (default 300 seconds)
//! - **Single flight**: every network fetch runs under one lock; callers that
//!   queued behind a fetch reuse its outcome instead of fetching again
//! - **Forced refresh**: a `kid` miss refetches once, unless the snapshot is
//!   younger than the minimum refresh interval
//! - **Bounded**: every fetch is wrapped in a timeout

use crate::config::VerifierConfig;
use crate::error::{FetchError, Result};
use crate::jwks::jwk::Jwk;
use crate::jwks::source::{HttpKeySetSource, KeySetSource};
use crate::jwks::KeySet;
use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Outcome of the most recent failed fetch, shared with queued callers
#[derive(Debug, Clone)]
struct FailedFetch {
    finished_at: Instant,
    error: FetchError,
}

/// Process-wide cache of a provider's key set.
///
/// Construct once at startup and share it (`Arc<KeySetCache>`) between every
/// verifier that trusts the same endpoint.
pub struct KeySetCache {
    url: String,
    source: Arc<dyn KeySetSource>,
    snapshots: Cache<String, Arc<KeySet>>,
    /// Held for the whole duration of a network fetch
    fetch_lock: Mutex<Option<FailedFetch>>,
    fetch_timeout: Duration,
    min_refresh_interval: Duration,
}

impl KeySetCache {
    /// Cache fetching over HTTPS with `reqwest`
    pub fn new(config: &VerifierConfig) -> Result<Self> {
        let source = HttpKeySetSource::new(config.fetch_timeout)?;
        Self::with_source(config, Arc::new(source))
    }

    /// Cache fetching through a caller-provided source
    pub fn with_source(config: &VerifierConfig, source: Arc<dyn KeySetSource>) -> Result<Self> {
        config.validate()?;

        let snapshots = Cache::builder()
            .time_to_live(config.cache_ttl)
            .max_capacity(1)
            .build();

        Ok(Self {
            url: config.jwks_url.clone(),
            source,
            snapshots,
            fetch_lock: Mutex::new(None),
            fetch_timeout: config.fetch_timeout,
            min_refresh_interval: config.min_refresh_interval,
        })
    }

    /// URL the key set is fetched from
    pub fn source_url(&self) -> &str {
        &self.url
    }

    /// Current snapshot, fetching it when the cache is cold or expired
    pub async fn key_set(&self) -> Result<Arc<KeySet>> {
        Ok(self.current().await?)
    }

    /// Fetch a new snapshot now, replacing the cached one
    pub async fn refresh(&self) -> Result<Arc<KeySet>> {
        let cached = self.snapshots.get(&self.url).await;
        Ok(self.fetch_replacing(cached.as_ref()).await?)
    }

    /// Drop the cached snapshot; the next lookup fetches again
    pub async fn invalidate(&self) {
        self.snapshots.invalidate(&self.url).await;
    }

    /// Find the key for `kid`.
    ///
    /// `Ok(None)` is a definitive miss: the provider's current key set does
    /// not publish `kid`. `Err` means the key set itself could not be
    /// obtained, which says nothing about the token.
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    pub(crate) async fn get_key(
        &self,
        kid: &str,
    ) -> std::result::Result<Option<Arc<Jwk>>, FetchError> {
        let snapshot = self.current().await?;
        if let Some(jwk) = snapshot.get(kid) {
            return Ok(Some(jwk));
        }

        if snapshot.fetched_at().elapsed() < self.min_refresh_interval {
            tracing::debug!("kid not in fresh key set; not refetching");
            return Ok(None);
        }

        tracing::debug!("kid not in cached key set; refetching");
        let refreshed = self.fetch_replacing(Some(&snapshot)).await?;
        Ok(refreshed.get(kid))
    }

    async fn current(&self) -> std::result::Result<Arc<KeySet>, FetchError> {
        if let Some(snapshot) = self.snapshots.get(&self.url).await {
            tracing::debug!(cache = "hit", "key set");
            return Ok(snapshot);
        }
        tracing::debug!(cache = "miss", "key set");
        self.fetch_replacing(None).await
    }

    /// Fetch a snapshot to replace `stale` (`None` when nothing was cached).
    ///
    /// Runs at most one fetch at a time. A caller that waited on the lock
    /// takes the result of the fetch it waited for: a snapshot newer than
    /// `stale`, or the error of a fetch that finished after it started waiting.
    async fn fetch_replacing(
        &self,
        stale: Option<&Arc<KeySet>>,
    ) -> std::result::Result<Arc<KeySet>, FetchError> {
        let waiting_since = Instant::now();
        let mut last_failure = self.fetch_lock.lock().await;

        if let Some(current) = self.snapshots.get(&self.url).await {
            let superseded = stale.is_none_or(|stale| !Arc::ptr_eq(stale, &current));
            if superseded {
                return Ok(current);
            }
        }
        if let Some(failed) = last_failure.as_ref() {
            if failed.finished_at >= waiting_since {
                return Err(failed.error.clone());
            }
        }

        let started = Instant::now();
        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch(&self.url))
            .await
        {
            Ok(Ok(body)) => KeySet::parse(&body),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        };

        match fetched {
            Ok(set) => {
                tracing::info!(
                    url = %self.url,
                    keys = set.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "fetched key set"
                );
                let set = Arc::new(set);
                self.snapshots.insert(self.url.clone(), set.clone()).await;
                *last_failure = None;
                Ok(set)
            }
            Err(error) => {
                tracing::warn!(url = %self.url, error = %error, "key set fetch failed");
                *last_failure = Some(FailedFetch {
                    finished_at: Instant::now(),
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("url", &self.url)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .finish_non_exhaustive()
    }
}
