//! Configuration loader: .env file, config.toml, then environment overrides.

use common::config::ProxyConfig;
use common::Error;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn parse_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 0")))
}

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn validate_config(config: &ProxyConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.fmp_api_key.trim().is_empty() {
        issues.push("FMP_API_KEY is required".into());
    }
    let base = config.fmp_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        issues.push("fmp_base_url must start with http:// or https://".into());
    }

    if config.cache.ttl_secs == 0 {
        issues.push("cache.ttl_secs must be > 0".into());
    }
    if config.rate_limit.provider.trim().is_empty() {
        issues.push("rate_limit.provider must not be empty".into());
    }
    if config.http.timeout_secs == 0 {
        issues.push("http.timeout_secs must be > 0".into());
    }
    if config.http.user_agent.trim().is_empty() {
        issues.push("http.user_agent must not be empty".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

fn config_path() -> PathBuf {
    match std::env::var("MARKET_PROXY_CONFIG") {
        Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

fn read_config_file(path: &Path) -> Result<Option<ProxyConfig>, Error> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    Ok(Some(config))
}

/// Load proxy configuration from environment and optional config file.
pub fn load_config() -> Result<ProxyConfig, Error> {
    // 1. Load .env file from the working directory or its parents.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Defaults, replaced by the config file when present.
    let path = config_path();
    let mut config = match read_config_file(&path)? {
        Some(config) => {
            tracing::debug!("Loaded {}", path.display());
            config
        }
        None => ProxyConfig::default(),
    };

    // 3. Environment variables win.
    if let Ok(key) = std::env::var("FMP_API_KEY") {
        config.fmp_api_key = key.trim().to_string();
    }
    if let Ok(url) = std::env::var("FMP_BASE_URL") {
        config.fmp_base_url = url.trim().to_string();
    }
    if let Ok(ttl) = std::env::var("CACHE_TTL_SECS") {
        config.cache.ttl_secs = parse_positive_u64(&ttl, "CACHE_TTL_SECS")?;
    }
    if let Ok(interval) = std::env::var("MIN_REQUEST_INTERVAL_MS") {
        config.rate_limit.min_interval_ms = parse_u64(&interval, "MIN_REQUEST_INTERVAL_MS")?;
    }
    if let Ok(backoff) = std::env::var("RATE_LIMIT_BACKOFF_MS") {
        config.rate_limit.backoff_ms = parse_u64(&backoff, "RATE_LIMIT_BACKOFF_MS")?;
    }
    if let Ok(timeout) = std::env::var("HTTP_TIMEOUT_SECS") {
        config.http.timeout_secs = parse_positive_u64(&timeout, "HTTP_TIMEOUT_SECS")?;
    }

    validate_config(&config)?;
    Ok(config)
}
