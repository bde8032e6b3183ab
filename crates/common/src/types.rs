//! Shared data types: query parameters and the JSON shapes handed to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Query parameters ──────────────────────────────────────────────────

/// A single query parameter value: upstream APIs take strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    fn to_json(&self) -> Value {
        match self {
            ParamValue::Int(n) => Value::from(*n),
            ParamValue::Float(x) => Value::from(*x),
            ParamValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        ParamValue::Int(n as i64)
    }
}

/// Flat, insertion-ordered query parameter map.
///
/// Order matters: it is part of the cache key, exactly as the caller built it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Replaces an existing value in place.
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `(name, value)` pairs ready for `reqwest::RequestBuilder::query`.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Compact JSON object text, keys in insertion order.
    pub fn to_json_string(&self) -> String {
        let fields: Vec<String> = self
            .entries
            .iter()
            .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), v.to_json()))
            .collect();
        format!("{{{}}}", fields.join(","))
    }
}

// ── Chart data ────────────────────────────────────────────────────────

/// One normalized OHLC point, ready for a lightweight chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataPoint {
    /// Unix seconds, UTC.
    pub timestamp: i64,
    /// Upstream date string, unchanged.
    pub date: String,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Short axis label: `HH:MM` intraday, `Mon D` otherwise.
    pub time_format: String,
    /// Long label, e.g. `1/5/2024, 3:30:00 PM`.
    pub full_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

/// Summary statistics attached to a history response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
    pub original_count: usize,
    pub actual_days_range: i64,
    pub requested_days: u32,
    pub interval: String,
    pub timeframe: String,
    pub cached: bool,
    pub source: String,
    pub symbol: String,
    pub is_intraday: bool,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub data: Vec<ChartDataPoint>,
    pub stats: HistoryStats,
}

// ── Stock detail ──────────────────────────────────────────────────────

/// Quote, company profile and key metrics merged into one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetail {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change24h: f64,
    pub change: f64,
    pub day_low: f64,
    pub day_high: f64,
    pub year_low: f64,
    pub year_high: f64,
    pub market_cap: f64,
    pub volume: f64,
    pub avg_volume: f64,
    pub pe: Option<f64>,
    pub eps: Option<f64>,
    pub shares_outstanding: f64,
    pub previous_close: f64,
    pub open: f64,

    pub sector: String,
    pub industry: String,
    pub country: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub ceo: Option<String>,
    pub employees: Option<String>,
    pub exchange: String,
    pub currency: String,

    pub last_update: DateTime<Utc>,
    pub market_open: bool,
    #[serde(rename = "isETF")]
    pub is_etf: bool,

    pub fifty_day_average: Option<f64>,
    pub two_hundred_day_average: Option<f64>,
    pub beta: Option<f64>,
    pub dividend_yield: Option<f64>,

    pub price_to_book: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_keep_insertion_order() {
        let params = QueryParams::new()
            .with("from", "2024-01-01")
            .with("to", "2024-03-31")
            .with("apikey", "demo");

        assert_eq!(
            params.to_json_string(),
            r#"{"from":"2024-01-01","to":"2024-03-31","apikey":"demo"}"#
        );
    }

    #[test]
    fn test_query_params_numbers_serialize_unquoted() {
        let params = QueryParams::new().with("limit", 5u32).with("apikey", "k");
        assert_eq!(params.to_json_string(), r#"{"limit":5,"apikey":"k"}"#);
        assert_eq!(
            params.pairs(),
            vec![
                ("limit".to_string(), "5".to_string()),
                ("apikey".to_string(), "k".to_string())
            ]
        );
    }

    #[test]
    fn test_query_params_accept_floats() {
        let params = QueryParams::new().with("minPrice", 0.5).with("limit", 10u32);
        assert_eq!(params.to_json_string(), r#"{"minPrice":0.5,"limit":10}"#);
        assert_eq!(params.get("minPrice"), Some(&ParamValue::Float(0.5)));
        assert_eq!(params.pairs()[0], ("minPrice".to_string(), "0.5".to_string()));
    }

    #[test]
    fn test_query_params_insert_replaces_in_place() {
        let mut params = QueryParams::new().with("a", "1").with("b", "2");
        params.insert("a", "3");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some(&ParamValue::Text("3".into())));
        assert_eq!(params.to_json_string(), r#"{"a":"3","b":"2"}"#);
    }

    #[test]
    fn test_empty_params() {
        let params = QueryParams::new();
        assert!(params.is_empty());
        assert_eq!(params.to_json_string(), "{}");
    }

    #[test]
    fn test_chart_point_serializes_camel_case() {
        let point = ChartDataPoint {
            timestamp: 1_704_067_200,
            date: "2024-01-01".into(),
            price: 10.0,
            open: 9.5,
            high: 10.5,
            low: 9.0,
            close: 10.0,
            volume: 1000.0,
            time_format: "Jan 1".into(),
            full_date: "1/1/2024, 12:00:00 AM".into(),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["timeFormat"], "Jan 1");
        assert_eq!(json["fullDate"], "1/1/2024, 12:00:00 AM");
    }
}
