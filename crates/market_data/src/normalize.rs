//! Raw upstream OHLC records to chart-ready points.
//!
//! Upstream shapes vary (`close` vs `price`, numbers vs numeric strings,
//! date-only vs date-time), so records are read loosely as JSON and anything
//! without a usable date and price is dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use common::ChartDataPoint;
use serde_json::Value;
use tracing::debug;

/// Point budget for intraday series.
pub const INTRADAY_MAX_POINTS: usize = 200;

/// Point budget for a timeframe.
pub fn max_points(days: u32, is_intraday: bool) -> usize {
    if is_intraday {
        return INTRADAY_MAX_POINTS;
    }
    match days {
        1 => 100,
        7 => 150,
        30 => 200,
        90 => 250,
        _ => 300,
    }
}

/// Parse an upstream date string as UTC.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, RFC 3339 and plain
/// `YYYY-MM-DD` (midnight).
pub fn parse_record_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Loose truthiness: null, false, 0, NaN and "" count as absent.
pub(crate) fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric value of a JSON number or numeric string.
pub(crate) fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// First present field among `keys`.
fn first_present<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| is_present(v))
}

/// Numeric field, or `fallback` when missing, zero or non-numeric.
fn number_or(record: &Value, key: &str, fallback: f64) -> f64 {
    record
        .get(key)
        .filter(|v| is_present(v))
        .and_then(as_number)
        .unwrap_or(fallback)
}

fn to_point(record: &Value, is_intraday: bool) -> Option<ChartDataPoint> {
    let date = record.get("date")?.as_str()?;
    let price = as_number(first_present(record, &["close", "price"])?)?;
    let parsed = parse_record_date(date)?;

    let timestamp = parsed.and_utc().timestamp();
    if timestamp <= 0 {
        return None;
    }

    let time_format = if is_intraday {
        parsed.format("%H:%M").to_string()
    } else {
        parsed.format("%b %-d").to_string()
    };

    Some(ChartDataPoint {
        timestamp,
        date: date.to_string(),
        price,
        open: number_or(record, "open", price),
        high: number_or(record, "high", price),
        low: number_or(record, "low", price),
        close: price,
        volume: number_or(record, "volume", 0.0),
        time_format,
        full_date: parsed.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
    })
}

/// Validate, convert, sort ascending and down-sample to the timeframe budget.
///
/// Down-sampling keeps every `ceil(n / budget)`-th point, starting with the
/// oldest.
pub fn normalize_chart_data(raw: &[Value], days: u32, is_intraday: bool) -> Vec<ChartDataPoint> {
    let mut points: Vec<ChartDataPoint> = raw
        .iter()
        .filter_map(|record| to_point(record, is_intraday))
        .collect();
    points.sort_by_key(|p| p.timestamp);

    let budget = max_points(days, is_intraday);
    if points.len() <= budget {
        debug!("Returning {} data points (no sampling needed)", points.len());
        return points;
    }

    let total = points.len();
    let step = total.div_ceil(budget);
    let sampled: Vec<ChartDataPoint> = points.into_iter().step_by(step).collect();
    debug!("Sampled {} points from {} total points", sampled.len(), total);
    sampled
}
