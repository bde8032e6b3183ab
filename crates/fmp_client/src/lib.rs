//! Financial Modeling Prep client library.
//!
//! Every upstream call goes through [`CachedFetcher`]: a time-bounded
//! response cache, a per-provider request-spacing limiter, a single retry
//! on HTTP 429, and single-flight de-duplication of concurrent misses.

pub mod cache;
pub mod fetcher;
pub mod rate_limit;
pub mod rest;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use cache::{cache_key, CacheEntry, ResponseCache};
pub use fetcher::{CachedFetcher, FetchSettings, Fetched};
pub use rate_limit::ProviderLimiter;
pub use rest::{ChartInterval, FmpClient};
pub use transport::{HttpTransport, Transport};

#[cfg(any(test, feature = "mock"))]
pub use mock::{RecordedCall, StubTransport};
