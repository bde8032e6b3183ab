//! Proxy configuration types.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Top-level proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Financial Modeling Prep API key.
    #[serde(default)]
    pub fmp_api_key: String,

    /// FMP REST base URL (no trailing slash).
    #[serde(default = "default_fmp_base_url")]
    pub fmp_base_url: String,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream request spacing and 429 handling.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Outbound HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached upstream payload stays fresh.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Limiter key. Every endpoint of one provider shares this slot.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Minimum spacing between two dispatches to the provider. 0 disables spacing.
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,

    /// Pause before the single retry after an HTTP 429.
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_fmp_base_url() -> String {
    DEFAULT_FMP_BASE_URL.to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_provider() -> String {
    "fmp".to_string()
}
fn default_min_interval() -> u64 {
    1000
}
fn default_backoff() -> u64 {
    5000
}

fn default_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    "market-proxy/0.1".to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            fmp_api_key: String::new(),
            fmp_base_url: default_fmp_base_url(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            min_interval_ms: default_min_interval(),
            backoff_ms: default_backoff(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
