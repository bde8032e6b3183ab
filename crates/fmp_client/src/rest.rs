//! FMP REST v3 endpoints.
//!
//! Covers: quotes, company profiles, key metrics, intraday/daily charts and
//! full daily price history. All methods go through the shared
//! [`CachedFetcher`], so they are cached and spaced per provider.

use chrono::NaiveDate;
use common::config::ProxyConfig;
use common::{Error, QueryParams, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::fetcher::{CachedFetcher, FetchSettings, Fetched};
use crate::transport::{HttpTransport, Transport};

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Bar size of a `historical-chart` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartInterval {
    FiveMin,
    FifteenMin,
    ThirtyMin,
    OneHour,
    FourHour,
    OneDay,
}

impl ChartInterval {
    /// Path segment FMP uses for this interval.
    pub fn as_path(&self) -> &'static str {
        match self {
            ChartInterval::FiveMin => "5min",
            ChartInterval::FifteenMin => "15min",
            ChartInterval::ThirtyMin => "30min",
            ChartInterval::OneHour => "1hour",
            ChartInterval::FourHour => "4hour",
            ChartInterval::OneDay => "1day",
        }
    }
}

impl std::fmt::Display for ChartInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Async client for the Financial Modeling Prep API.
#[derive(Debug)]
pub struct FmpClient<T: Transport = HttpTransport> {
    fetcher: CachedFetcher<T>,
    base_url: String,
    api_key: String,
}

impl<T: Transport> Clone for FmpClient<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

impl FmpClient<HttpTransport> {
    /// Production client: reqwest transport, settings from config.
    pub fn from_config(cfg: &ProxyConfig) -> Result<Self> {
        if cfg.fmp_api_key.trim().is_empty() {
            return Err(Error::Config("FMP API key not configured".into()));
        }

        let transport = HttpTransport::new(
            Duration::from_secs(cfg.http.timeout_secs),
            &cfg.http.user_agent,
        )?;
        let fetcher = CachedFetcher::new(Arc::new(transport), FetchSettings::from_config(cfg));

        let client = Self::new(fetcher, &cfg.fmp_base_url, &cfg.fmp_api_key);
        info!("FMP client ready: {}", client.base_url);
        Ok(client)
    }
}

impl<T: Transport> FmpClient<T> {
    pub fn new(fetcher: CachedFetcher<T>, base_url: &str, api_key: &str) -> Self {
        let mut base_url = normalize_base_url(base_url);
        if base_url.is_empty() {
            warn!("Ignoring empty FMP base URL");
            base_url = normalize_base_url(common::config::DEFAULT_FMP_BASE_URL);
        }

        Self {
            fetcher,
            base_url,
            api_key: api_key.to_string(),
        }
    }

    pub fn fetcher(&self) -> &CachedFetcher<T> {
        &self.fetcher
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL helper.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn key_params(&self) -> QueryParams {
        QueryParams::new().with("apikey", self.api_key.as_str())
    }

    // ── Company data ──────────────────────────────────────────────────

    /// `quote/{symbol}`: array with at most one quote.
    pub async fn quote(&self, symbol: &str) -> Result<Fetched> {
        let url = self.url(&format!("/quote/{}", symbol));
        self.fetcher.fetch(&url, &self.key_params()).await
    }

    /// `profile/{symbol}`: array with at most one company profile.
    pub async fn profile(&self, symbol: &str) -> Result<Fetched> {
        let url = self.url(&format!("/profile/{}", symbol));
        self.fetcher.fetch(&url, &self.key_params()).await
    }

    /// `key-metrics/{symbol}`: yearly metrics, newest first.
    pub async fn key_metrics(&self, symbol: &str) -> Result<Fetched> {
        let url = self.url(&format!("/key-metrics/{}", symbol));
        self.fetcher.fetch(&url, &self.key_params()).await
    }

    // ── Price history ─────────────────────────────────────────────────

    /// `historical-chart/{interval}/{symbol}`: bars, newest first.
    pub async fn historical_chart(&self, interval: ChartInterval, symbol: &str) -> Result<Fetched> {
        let url = self.url(&format!("/historical-chart/{}/{}", interval.as_path(), symbol));
        self.fetcher.fetch(&url, &self.key_params()).await
    }

    /// `historical-price-full/{symbol}` between two dates (inclusive):
    /// `{ symbol, historical: [...] }`.
    pub async fn historical_price_full(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Fetched> {
        let url = self.url(&format!("/historical-price-full/{}", symbol));
        let params = QueryParams::new()
            .with("from", from.format("%Y-%m-%d").to_string())
            .with("to", to.format("%Y-%m-%d").to_string())
            .with("apikey", self.api_key.as_str());
        self.fetcher.fetch(&url, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StubTransport;
    use common::ParamValue;
    use serde_json::json;

    const BASE: &str = "https://fmp.test/api/v3";

    fn client(transport: Arc<StubTransport>) -> FmpClient<StubTransport> {
        let settings = FetchSettings {
            min_interval: Duration::ZERO,
            ..FetchSettings::default()
        };
        FmpClient::new(CachedFetcher::new(transport, settings), BASE, "secret")
    }

    #[test]
    fn test_chart_interval_paths() {
        assert_eq!(ChartInterval::OneHour.as_path(), "1hour");
        assert_eq!(ChartInterval::FourHour.to_string(), "4hour");
        assert_eq!(ChartInterval::OneDay.as_path(), "1day");
    }

    #[test]
    fn test_base_url_is_normalized() {
        let c = client(Arc::new(StubTransport::new()));
        assert_eq!(c.base_url(), BASE);

        let fetcher = CachedFetcher::new(Arc::new(StubTransport::new()), FetchSettings::default());
        let c = FmpClient::new(fetcher, " https://fmp.test/api/v3/ ", "k");
        assert_eq!(c.url("/quote/MSFT"), "https://fmp.test/api/v3/quote/MSFT");
    }

    #[test]
    fn test_empty_base_url_falls_back_to_default() {
        let fetcher = CachedFetcher::new(Arc::new(StubTransport::new()), FetchSettings::default());
        let c = FmpClient::new(fetcher, "  ", "k");
        assert_eq!(c.base_url(), common::config::DEFAULT_FMP_BASE_URL);
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let err = FmpClient::<HttpTransport>::from_config(&ProxyConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_quote_sends_api_key() {
        let transport = Arc::new(StubTransport::new());
        transport
            .push_json(&format!("{}/quote/AAPL", BASE), json!([{"symbol": "AAPL"}]))
            .await;
        let c = client(transport.clone());

        let fetched = c.quote("AAPL").await.unwrap();
        assert_eq!(fetched.payload[0]["symbol"], "AAPL");

        let calls = transport.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].params.get("apikey"),
            Some(&ParamValue::Text("secret".into()))
        );
    }

    #[tokio::test]
    async fn test_historical_price_full_sends_date_window() {
        let transport = Arc::new(StubTransport::new());
        transport
            .push_json(
                &format!("{}/historical-price-full/MSFT", BASE),
                json!({"symbol": "MSFT", "historical": []}),
            )
            .await;
        let c = client(transport.clone());

        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        c.historical_price_full("MSFT", from, to).await.unwrap();

        let calls = transport.calls().await;
        assert_eq!(
            calls[0].params.to_json_string(),
            r#"{"from":"2024-01-01","to":"2024-03-31","apikey":"secret"}"#
        );
    }

    #[tokio::test]
    async fn test_historical_chart_url() {
        let transport = Arc::new(StubTransport::new());
        let url = format!("{}/historical-chart/30min/ETHUSD", BASE);
        transport.push_json(&url, json!([])).await;
        let c = client(transport.clone());

        c.historical_chart(ChartInterval::ThirtyMin, "ETHUSD")
            .await
            .unwrap();
        assert_eq!(transport.called_urls().await, vec![url]);
    }
}
