//! Lookup entry points: stock and crypto history, stock detail.

use chrono::{DateTime, Utc};
use common::config::ProxyConfig;
use common::{Error, HistoryResponse, Result, StockDetail};
use fmp_client::{FmpClient, HttpTransport, Transport};
use serde_json::Value;
use tracing::{info, warn};

use crate::detail::build_stock_detail;
use crate::history::{fetch_eod, fetch_intraday};
use crate::normalize::normalize_chart_data;
use crate::stats::{summarize, Precision, SeriesContext};
use crate::symbols::to_fmp_symbol;

/// Market data service. Cheap to clone; clones share the cache and limiter.
#[derive(Debug)]
pub struct MarketData<T: Transport = HttpTransport> {
    fmp: FmpClient<T>,
}

impl<T: Transport> Clone for MarketData<T> {
    fn clone(&self) -> Self {
        Self {
            fmp: self.fmp.clone(),
        }
    }
}

impl MarketData<HttpTransport> {
    pub fn from_config(cfg: &ProxyConfig) -> Result<Self> {
        Ok(Self::new(FmpClient::<HttpTransport>::from_config(cfg)?))
    }
}

fn require_symbol(raw: &str, name: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingParameter(format!("{} parameter is required", name)));
    }
    Ok(trimmed.to_string())
}

fn require_days(days: u32) -> Result<u32> {
    if days == 0 {
        return Err(Error::InvalidParameter("days must be at least 1".into()));
    }
    Ok(days)
}

/// First element of a non-empty array payload.
fn first_record(payload: &Value) -> Option<&Value> {
    payload.as_array().and_then(|a| a.first())
}

impl<T: Transport> MarketData<T> {
    pub fn new(fmp: FmpClient<T>) -> Self {
        Self { fmp }
    }

    pub fn client(&self) -> &FmpClient<T> {
        &self.fmp
    }

    /// Chart history for a stock ticker over `days` (1 = intraday).
    pub async fn stock_history(&self, symbol: &str, days: u32) -> Result<HistoryResponse> {
        let symbol = require_symbol(symbol, "Symbol")?.to_uppercase();
        self.history(&symbol, require_days(days)?, Precision::Cents, Utc::now())
            .await
    }

    /// Chart history for a crypto id such as `bitcoin`.
    pub async fn crypto_history(&self, id: &str, days: u32) -> Result<HistoryResponse> {
        let id = require_symbol(id, "Crypto ID")?;
        let pair = to_fmp_symbol(&id);
        info!("Mapped crypto id {} to {}", id, pair);
        self.history(&pair, require_days(days)?, Precision::Adaptive, Utc::now())
            .await
    }

    async fn history(
        &self,
        symbol: &str,
        days: u32,
        precision: Precision,
        now: DateTime<Utc>,
    ) -> Result<HistoryResponse> {
        let is_intraday = days == 1;
        info!(
            "Fetching {} data for {} ({} days)",
            if is_intraday { "intraday" } else { "EOD" },
            symbol,
            days
        );

        let raw = if is_intraday {
            fetch_intraday(&self.fmp, symbol, now).await?
        } else {
            fetch_eod(&self.fmp, symbol, days, now.date_naive()).await?
        };

        if raw.records.is_empty() {
            return Err(Error::NotFound(format!("No price data available for {}", symbol)));
        }
        info!(
            "Retrieved {} raw data points from {}",
            raw.records.len(),
            raw.endpoint
        );

        let data = normalize_chart_data(&raw.records, days, is_intraday);
        let ctx = SeriesContext {
            symbol,
            requested_days: days,
            is_intraday,
            original_count: raw.records.len(),
            cached: raw.cached,
            precision,
        };
        let stats = summarize(&data, &ctx).ok_or_else(|| {
            Error::NotFound(format!("No valid chart data after processing for {}", symbol))
        })?;

        info!(
            "Processed {} chart data points spanning {} days for {}",
            stats.count, stats.actual_days_range, symbol
        );
        Ok(HistoryResponse { data, stats })
    }

    /// Quote, profile and key metrics for a stock ticker.
    ///
    /// Only the quote is required; profile and metrics failures are logged
    /// and leave their fields at defaults.
    pub async fn stock_detail(&self, symbol: &str) -> Result<StockDetail> {
        let symbol = require_symbol(symbol, "Symbol")?.to_uppercase();

        let quote = self.fmp.quote(&symbol).await?;
        let Some(quote) = first_record(&quote.payload).cloned() else {
            return Err(Error::NotFound(format!("Stock not found: {}", symbol)));
        };

        let profile = match self.fmp.profile(&symbol).await {
            Ok(fetched) => first_record(&fetched.payload).cloned(),
            Err(e) => {
                warn!("Profile data not available for {}: {}", symbol, e);
                None
            }
        };

        let metrics = match self.fmp.key_metrics(&symbol).await {
            Ok(fetched) => first_record(&fetched.payload).cloned(),
            Err(e) => {
                warn!("Metrics data not available for {}: {}", symbol, e);
                None
            }
        };

        Ok(build_stock_detail(
            &symbol,
            &quote,
            profile.as_ref(),
            metrics.as_ref(),
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use fmp_client::{CachedFetcher, FetchSettings, StubTransport};
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "https://fmp.test/api/v3";

    fn service(transport: Arc<StubTransport>) -> MarketData<StubTransport> {
        let settings = FetchSettings {
            min_interval: std::time::Duration::ZERO,
            ..FetchSettings::default()
        };
        MarketData::new(FmpClient::new(
            CachedFetcher::new(transport, settings),
            BASE,
            "k",
        ))
    }

    fn url(path: &str) -> String {
        format!("{}{}", BASE, path)
    }

    fn daily_history(days: i64) -> Value {
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let items: Vec<Value> = (0..days)
            .map(|i| {
                let d = end - Duration::days(i);
                json!({"date": d.format("%Y-%m-%d").to_string(), "close": 100.0 + i as f64, "volume": 10})
            })
            .collect();
        json!({"symbol": "AAPL", "historical": items})
    }

    #[tokio::test]
    async fn test_stock_history_eod() {
        let transport = Arc::new(StubTransport::new());
        transport
            .push_json(&url("/historical-price-full/AAPL"), daily_history(60))
            .await;
        let svc = service(transport.clone());

        let resp = svc.stock_history("aapl", 30).await.unwrap();

        assert_eq!(resp.data.len(), 60);
        assert!(resp.data.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        let stats = &resp.stats;
        assert_eq!(stats.symbol, "AAPL");
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 159.0);
        assert_eq!(stats.avg, 129.5);
        assert_eq!(stats.original_count, 60);
        assert_eq!(stats.actual_days_range, 59);
        assert_eq!(stats.interval, "daily");
        assert_eq!(stats.timeframe, "1 month (extended)");
        assert_eq!(stats.source, "FMP Extended EOD");
        assert!(!stats.is_intraday);
        assert!(!stats.cached);

        let again = svc.stock_history("AAPL", 30).await.unwrap();
        assert!(again.stats.cached);
        assert_eq!(transport.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_stock_history_intraday() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 16, 0, 0).unwrap();
        let bars: Vec<Value> = (0..48)
            .map(|i| {
                let at = now - Duration::hours(i);
                json!({"date": at.format("%Y-%m-%d %H:%M:%S").to_string(), "close": 50.0})
            })
            .collect();
        let transport = Arc::new(StubTransport::new());
        transport
            .push_json(&url("/historical-chart/1hour/MSFT"), Value::Array(bars))
            .await;
        let svc = service(transport);

        let resp = svc
            .history("MSFT", 1, Precision::Cents, now)
            .await
            .unwrap();

        assert_eq!(resp.data.len(), 48);
        assert_eq!(resp.data.last().unwrap().time_format, "16:00");
        assert_eq!(resp.stats.interval, "hourly/intraday");
        assert_eq!(resp.stats.source, "FMP Extended Intraday");
        assert_eq!(resp.stats.timeframe, "1 day (extended)");
        assert!(resp.stats.is_intraday);
    }

    #[tokio::test]
    async fn test_crypto_history_maps_id() {
        let transport = Arc::new(StubTransport::new());
        transport
            .push_json(
                &url("/historical-price-full/DOGEUSD"),
                json!({"historical": [
                    {"date": "2024-01-09", "close": 0.08123449},
                    {"date": "2024-01-10", "close": 0.08234567}
                ]}),
            )
            .await;
        let svc = service(transport);

        let resp = svc.crypto_history("dogecoin", 7).await.unwrap();

        assert_eq!(resp.stats.symbol, "DOGEUSD");
        assert_eq!(resp.stats.min, 0.081234);
        assert_eq!(resp.stats.max, 0.082346);
    }

    #[tokio::test]
    async fn test_parameter_validation() {
        let svc = service(Arc::new(StubTransport::new()));

        let err = svc.stock_history("  ", 7).await.unwrap_err();
        assert!(matches!(err, Error::MissingParameter(_)));
        assert_eq!(err.status_code(), 400);

        let err = svc.crypto_history("", 7).await.unwrap_err();
        assert!(matches!(err, Error::MissingParameter(_)));

        let err = svc.stock_history("AAPL", 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));

        let err = svc.stock_history("AAPL", 100_000_000).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_unusable_records_are_not_found() {
        let transport = Arc::new(StubTransport::new());
        transport
            .push_json(
                &url("/historical-price-full/BAD"),
                json!({"historical": [{"date": "garbage", "close": "x"}]}),
            )
            .await;
        let svc = service(transport);

        let err = svc.stock_history("BAD", 7).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_response().status, 404);
    }

    #[tokio::test]
    async fn test_stock_detail_tolerates_missing_profile() {
        let transport = Arc::new(StubTransport::new());
        transport
            .push_json(
                &url("/quote/AAPL"),
                json!([{"symbol": "AAPL", "name": "Apple", "price": 185.0}]),
            )
            .await;
        transport
            .push(
                &url("/profile/AAPL"),
                Err(Error::Http("connection reset".into())),
            )
            .await;
        transport
            .push_json(&url("/key-metrics/AAPL"), json!([{"roe": 1.5}]))
            .await;
        let svc = service(transport.clone());

        let detail = svc.stock_detail("aapl").await.unwrap();

        assert_eq!(detail.symbol, "AAPL");
        assert_eq!(detail.name, "Apple");
        assert_eq!(detail.sector, "N/A");
        assert_eq!(detail.return_on_equity, Some(1.5));
        assert_eq!(transport.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_stock_detail_empty_quote_is_not_found() {
        let transport = Arc::new(StubTransport::new());
        transport.push_json(&url("/quote/ZZZZ"), json!([])).await;
        let svc = service(transport.clone());

        let err = svc.stock_detail("ZZZZ").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(transport.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_stock_detail_propagates_auth_failure() {
        let transport = Arc::new(StubTransport::new());
        transport
            .push(
                &url("/quote/AAPL"),
                Err(Error::Unauthorized("Invalid API KEY".into())),
            )
            .await;
        let svc = service(transport);

        let err = svc.stock_detail("AAPL").await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
