//! Cached, rate-limited upstream fetches.
//!
//! Request flow for one `(url, params)`:
//! 1. Fresh cache entry → return it, no network, no limiter bookkeeping.
//! 2. Same request already in flight → await that shared fetch.
//! 3. Otherwise claim the provider's limiter slot, GET, cache, return.
//!    An HTTP 429 is retried exactly once after the backoff.

use common::config::ProxyConfig;
use common::{Error, QueryParams, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{cache_key, ResponseCache};
use crate::rate_limit::ProviderLimiter;
use crate::transport::Transport;

/// Tunables for cache freshness, spacing and 429 handling.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Limiter key shared by every endpoint of the upstream.
    pub provider: String,
    pub cache_ttl: Duration,
    pub min_interval: Duration,
    pub rate_limit_backoff: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            provider: "fmp".to_string(),
            cache_ttl: Duration::from_secs(5 * 60),
            min_interval: Duration::from_secs(1),
            rate_limit_backoff: Duration::from_secs(5),
        }
    }
}

impl FetchSettings {
    pub fn from_config(cfg: &ProxyConfig) -> Self {
        Self {
            provider: cfg.rate_limit.provider.clone(),
            cache_ttl: Duration::from_secs(cfg.cache.ttl_secs),
            min_interval: Duration::from_millis(cfg.rate_limit.min_interval_ms),
            rate_limit_backoff: Duration::from_millis(cfg.rate_limit.backoff_ms),
        }
    }
}

/// An upstream payload and whether it came out of the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub payload: Value,
    pub from_cache: bool,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Value>>>;

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

/// Explicitly constructed fetch service. Clones share cache, limiter and
/// in-flight state, so one instance can be handed to every caller.
pub struct CachedFetcher<T: Transport> {
    transport: Arc<T>,
    cache: ResponseCache,
    limiter: ProviderLimiter,
    in_flight: Arc<DashMap<String, InFlight>>,
    next_id: Arc<AtomicU64>,
    settings: FetchSettings,
}

impl<T: Transport> Clone for CachedFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: self.cache.clone(),
            limiter: self.limiter.clone(),
            in_flight: Arc::clone(&self.in_flight),
            next_id: Arc::clone(&self.next_id),
            settings: self.settings.clone(),
        }
    }
}

impl<T: Transport> std::fmt::Debug for CachedFetcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedFetcher")
            .field("settings", &self.settings)
            .field("cached_entries", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl<T: Transport> CachedFetcher<T> {
    pub fn new(transport: Arc<T>, settings: FetchSettings) -> Self {
        Self {
            transport,
            cache: ResponseCache::new(),
            limiter: ProviderLimiter::new(settings.min_interval),
            in_flight: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
            settings,
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Payload-only form of [`fetch`](Self::fetch).
    pub async fn rate_limited_request(&self, url: &str, params: &QueryParams) -> Result<Value> {
        self.fetch(url, params).await.map(|f| f.payload)
    }

    /// Cached, spaced, single-flight GET.
    pub async fn fetch(&self, url: &str, params: &QueryParams) -> Result<Fetched> {
        let key = cache_key(url, params);

        if let Some(payload) = self.cache.get_fresh(&key, self.settings.cache_ttl) {
            debug!("Returning cached data for {}", url);
            return Ok(Fetched {
                payload,
                from_cache: true,
            });
        }

        let (id, fetch) = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(existing) => {
                debug!("Joining in-flight request for {}", url);
                (existing.get().id, existing.get().fetch.clone())
            }
            Entry::Vacant(slot) => {
                // A previous fetch may have finished between the cache check
                // and taking this slot.
                if let Some(payload) = self.cache.get_fresh(&key, self.settings.cache_ttl) {
                    return Ok(Fetched {
                        payload,
                        from_cache: true,
                    });
                }
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let fetch = self
                    .dispatch(key.clone(), url.to_string(), params.clone())
                    .boxed()
                    .shared();
                slot.insert(InFlight {
                    id,
                    fetch: fetch.clone(),
                });
                (id, fetch)
            }
        };

        let result = fetch.await;
        self.in_flight.remove_if(&key, |_, entry| entry.id == id);

        result.map(|payload| Fetched {
            payload,
            from_cache: false,
        })
    }

    /// The network half of a fetch. Owns everything it touches so it can be
    /// shared between waiters.
    fn dispatch(
        &self,
        key: String,
        url: String,
        params: QueryParams,
    ) -> impl std::future::Future<Output = Result<Value>> + Send + 'static {
        let transport = Arc::clone(&self.transport);
        let cache = self.cache.clone();
        let limiter = self.limiter.clone();
        let settings = self.settings.clone();

        async move {
            limiter.until_ready(&settings.provider).await;

            let payload = match transport.get_json(&url, &params).await {
                Ok(payload) => payload,
                Err(Error::RateLimited { .. }) => {
                    warn!(
                        "Rate limit hit on {}, waiting {}ms before retrying once",
                        url,
                        settings.rate_limit_backoff.as_millis()
                    );
                    tokio::time::sleep(settings.rate_limit_backoff).await;
                    limiter.until_ready(&settings.provider).await;
                    transport.get_json(&url, &params).await?
                }
                Err(e) => return Err(e),
            };

            cache.insert(key, payload.clone());
            Ok(payload)
        }
    }
}
