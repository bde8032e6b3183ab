//! Merge an FMP quote with optional profile and key metrics.
//!
//! Upstream fields are loosely typed: a missing, null, zero or empty value
//! falls through to the next candidate, like the quote page expects.

use chrono::{DateTime, Utc};
use common::StockDetail;
use serde_json::Value;

use crate::normalize::{as_number, is_present};

/// A view over an optional JSON object.
#[derive(Clone, Copy)]
struct Fields<'a>(Option<&'a Value>);

impl<'a> Fields<'a> {
    fn present(&self, key: &str) -> Option<&'a Value> {
        self.0?.get(key).filter(|v| is_present(v))
    }

    fn num(&self, key: &str) -> Option<f64> {
        self.present(key).and_then(as_number)
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.present(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.present(key).is_some()
    }
}

/// Build a [`StockDetail`] for `symbol` as of `now`.
pub fn build_stock_detail(
    symbol: &str,
    quote: &Value,
    profile: Option<&Value>,
    metrics: Option<&Value>,
    now: DateTime<Utc>,
) -> StockDetail {
    let q = Fields(Some(quote));
    let p = Fields(profile);
    let m = Fields(metrics);

    let price = q.num("price").unwrap_or(0.0);
    let volume = q.num("volume").unwrap_or(0.0);
    let is_etf = q.flag("isEtfOrFund");

    StockDetail {
        symbol: q.text("symbol").unwrap_or_else(|| symbol.to_string()),
        name: p
            .text("companyName")
            .or_else(|| q.text("name"))
            .unwrap_or_else(|| symbol.to_string()),
        price,
        change24h: q.num("changesPercentage").unwrap_or(0.0),
        change: q.num("change").unwrap_or(0.0),
        day_low: q.num("dayLow").unwrap_or(price),
        day_high: q.num("dayHigh").unwrap_or(price),
        year_low: q.num("yearLow").unwrap_or(price),
        year_high: q.num("yearHigh").unwrap_or(price),
        market_cap: q.num("marketCap").or_else(|| p.num("mktCap")).unwrap_or(0.0),
        volume,
        avg_volume: q.num("avgVolume").unwrap_or(volume),
        pe: q.num("pe").or_else(|| m.num("peRatio")),
        eps: q.num("eps").or_else(|| m.num("netIncomePerShare")),
        shares_outstanding: q
            .num("sharesOutstanding")
            .or_else(|| p.num("volAvg"))
            .unwrap_or(0.0),
        previous_close: q.num("previousClose").unwrap_or(price),
        open: q.num("open").unwrap_or(price),

        sector: p.text("sector").unwrap_or_else(|| "N/A".into()),
        industry: p.text("industry").unwrap_or_else(|| "N/A".into()),
        country: p.text("country").unwrap_or_else(|| "N/A".into()),
        website: p.text("website"),
        description: p.text("description"),
        ceo: p.text("ceo"),
        employees: p.text("fullTimeEmployees"),
        exchange: q
            .text("exchange")
            .or_else(|| p.text("exchangeShortName"))
            .unwrap_or_else(|| "NASDAQ".into()),
        currency: p.text("currency").unwrap_or_else(|| "USD".into()),

        last_update: now,
        market_open: !is_etf,
        is_etf,

        fifty_day_average: q.num("priceAvg50"),
        two_hundred_day_average: q.num("priceAvg200"),
        beta: p.num("beta"),
        dividend_yield: m.num("dividendYield"),

        price_to_book: m.num("pbRatio"),
        price_to_sales: m.num("psRatio"),
        return_on_equity: m.num("roe"),
        return_on_assets: m.num("roa"),
        debt_to_equity: m.num("debtToEquity"),
    }
}
