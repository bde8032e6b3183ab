//! Raw price history retrieval with endpoint fallback.
//!
//! Intraday lookups walk the `historical-chart` intervals from coarse to fine
//! until one covers enough of the last week. Multi-day lookups prefer the
//! full daily history over an extended window and fall back to the daily chart.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::{Error, Result};
use fmp_client::{ChartInterval, Fetched, FmpClient, Transport};
use serde_json::Value;
use tracing::{info, warn};

use crate::fallback::{first_success, Attempt, FallbackOutcome};
use crate::normalize::parse_record_date;

/// Intraday intervals in the order they are tried.
pub const INTRADAY_INTERVALS: [ChartInterval; 5] = [
    ChartInterval::OneHour,
    ChartInterval::FourHour,
    ChartInterval::ThirtyMin,
    ChartInterval::FifteenMin,
    ChartInterval::FiveMin,
];

const INTRADAY_LOOKBACK_DAYS: i64 = 7;
const INTRADAY_MIN_POINTS: usize = 20;
const INTRADAY_MAX_RECORDS: usize = 200;
const INTRADAY_PARTIAL_RECORDS: usize = 100;
const DAILY_CHART_MAX_RECORDS: usize = 365;

/// Raw upstream records plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub records: Vec<Value>,
    /// Whether the winning fetch was served from the response cache.
    pub cached: bool,
    pub endpoint: String,
}

impl RawSeries {
    fn from_fetch(records: Vec<Value>, fetched: &Fetched, endpoint: impl Into<String>) -> Self {
        Self {
            records,
            cached: fetched.from_cache,
            endpoint: endpoint.into(),
        }
    }
}

/// Source of a multi-day series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EodSource {
    HistoricalPriceFull,
    DailyChart,
}

/// Days of history requested upstream for a `days` lookup.
pub fn extended_window_days(days: u32) -> i64 {
    (i64::from(days) * 3).max(90)
}

/// Why an endpoint failed, for deciding what a failed chain reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    RateLimited,
    Unauthorized,
    NotFound,
    Other,
}

fn failure_kind(e: &Error) -> FailureKind {
    match e {
        Error::RateLimited { .. } => FailureKind::RateLimited,
        Error::Unauthorized(_) => FailureKind::Unauthorized,
        Error::NotFound(_) | Error::Upstream { status: 404, .. } => FailureKind::NotFound,
        _ => FailureKind::Other,
    }
}

/// Error for a chain where nothing usable came back.
///
/// When every endpoint failed the same client-meaningful way (rate limited,
/// unauthorized, not found) that error is surfaced as-is; anything mixed is
/// reported as `Exhausted`.
fn exhausted<S>(label: &str, failures: Vec<(S, Error)>) -> Error {
    let mut kinds = failures.iter().map(|(_, e)| failure_kind(e));
    let shared = kinds
        .next()
        .is_some_and(|first| first != FailureKind::Other && kinds.all(|k| k == first));
    match failures.into_iter().last() {
        Some((_, e)) if shared => e,
        _ => Error::Exhausted(label.to_string()),
    }
}

fn non_empty_array(payload: &Value) -> Option<&Vec<Value>> {
    payload.as_array().filter(|a| !a.is_empty())
}

/// Fetch a 1-day intraday series as of `now`.
pub async fn fetch_intraday<T: Transport>(
    fmp: &FmpClient<T>,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<RawSeries> {
    let since = (now - Duration::days(INTRADAY_LOOKBACK_DAYS)).naive_utc();
    let until = now.naive_utc();

    let outcome = first_success(INTRADAY_INTERVALS, |interval| async move {
        let fetched = fmp.historical_chart(interval, symbol).await?;
        let endpoint = format!("historical-chart/{}", interval);

        let Some(records) = non_empty_array(&fetched.payload) else {
            return Err(Error::NotFound(format!("no data from {}", endpoint)));
        };

        let recent: Vec<Value> = records
            .iter()
            .filter(|r| {
                r.get("date")
                    .and_then(Value::as_str)
                    .and_then(parse_record_date)
                    .is_some_and(|d| d >= since && d <= until)
            })
            .take(INTRADAY_MAX_RECORDS)
            .cloned()
            .collect();

        if recent.len() >= INTRADAY_MIN_POINTS {
            info!("Using {} points from {} for {}", recent.len(), endpoint, symbol);
            Ok(Attempt::Accept(RawSeries::from_fetch(recent, &fetched, endpoint)))
        } else {
            let partial: Vec<Value> = records.iter().take(INTRADAY_PARTIAL_RECORDS).cloned().collect();
            Ok(Attempt::Insufficient(RawSeries::from_fetch(partial, &fetched, endpoint)))
        }
    })
    .await;

    match outcome {
        FallbackOutcome::Found { data, .. } => Ok(data),
        FallbackOutcome::Exhausted {
            insufficient,
            failures,
        } => match insufficient.into_iter().next() {
            Some((interval, series)) => {
                warn!(
                    "No intraday interval had enough recent data for {}, using latest {} points from {}",
                    symbol,
                    series.records.len(),
                    interval
                );
                Ok(series)
            }
            None => Err(exhausted("intraday", failures)),
        },
    }
}

/// Fetch a multi-day daily series ending `today`.
pub async fn fetch_eod<T: Transport>(
    fmp: &FmpClient<T>,
    symbol: &str,
    days: u32,
    today: NaiveDate,
) -> Result<RawSeries> {
    let from = today
        .checked_sub_signed(Duration::days(extended_window_days(days)))
        .ok_or_else(|| Error::InvalidParameter(format!("days out of range: {}", days)))?;
    let strategies = [EodSource::HistoricalPriceFull, EodSource::DailyChart];

    let outcome = first_success(strategies, |source| async move {
        match source {
            EodSource::HistoricalPriceFull => {
                let fetched = fmp.historical_price_full(symbol, from, today).await?;
                let records = fetched
                    .payload
                    .get("historical")
                    .and_then(non_empty_array)
                    .cloned()
                    .ok_or_else(|| Error::NotFound("no historical array".into()))?;
                info!("Retrieved {} historical data points for {}", records.len(), symbol);
                Ok::<_, Error>(Attempt::Accept(RawSeries::from_fetch(
                    records,
                    &fetched,
                    "historical-price-full",
                )))
            }
            EodSource::DailyChart => {
                let fetched = fmp.historical_chart(ChartInterval::OneDay, symbol).await?;
                let records: Vec<Value> = non_empty_array(&fetched.payload)
                    .ok_or_else(|| Error::NotFound("empty daily chart".into()))?
                    .iter()
                    .take(DAILY_CHART_MAX_RECORDS)
                    .cloned()
                    .collect();
                info!("Retrieved {} fallback data points for {}", records.len(), symbol);
                Ok(Attempt::Accept(RawSeries::from_fetch(
                    records,
                    &fetched,
                    "historical-chart/1day",
                )))
            }
        }
    })
    .await;

    match outcome {
        FallbackOutcome::Found { data, .. } => Ok(data),
        FallbackOutcome::Exhausted { failures, .. } => {
            for (source, e) in &failures {
                warn!("{:?} failed for {}: {}", source, symbol, e);
            }
            Err(exhausted("EOD", failures))
        }
    }
}
