//! Request-spacing limiter keyed by provider name.
//!
//! One slot per provider, shared by all of its endpoints. A GCRA quota with
//! a period of `min_interval` and a burst of one means a dispatch is never
//! allowed sooner than `min_interval` after the previous one, even when
//! several tasks wait at once.

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
pub struct ProviderLimiter {
    inner: Option<Arc<DefaultKeyedRateLimiter<String>>>,
    min_interval: Duration,
}

impl ProviderLimiter {
    /// Create a limiter that spaces dispatches by `min_interval`.
    /// A zero interval disables spacing.
    pub fn new(min_interval: Duration) -> Self {
        let inner =
            Quota::with_period(min_interval).map(|quota| Arc::new(RateLimiter::keyed(quota)));
        Self {
            inner,
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until `provider` may dispatch, then claim the slot.
    ///
    /// Returns how long the caller was held back.
    pub async fn until_ready(&self, provider: &str) -> Duration {
        let Some(limiter) = &self.inner else {
            return Duration::ZERO;
        };

        let started = Instant::now();
        limiter.until_key_ready(&provider.to_string()).await;
        let waited = started.elapsed();

        if waited >= Duration::from_millis(1) {
            debug!("Rate limiting {}: waited {}ms", provider, waited.as_millis());
        }
        waited
    }

}

impl std::fmt::Debug for ProviderLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderLimiter")
            .field("min_interval", &self.min_interval)
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

impl Default for ProviderLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
