//! Market data lookups built on the FMP client.
//!
//! Fetches price history through ordered endpoint fallbacks, normalizes it
//! into chart-ready points, and assembles stock detail records.

pub mod detail;
pub mod fallback;
pub mod history;
pub mod normalize;
pub mod service;
pub mod stats;
pub mod symbols;

pub use fallback::{first_success, Attempt, FallbackOutcome};
pub use history::{fetch_eod, fetch_intraday, RawSeries};
pub use normalize::{max_points, normalize_chart_data};
pub use service::MarketData;
pub use symbols::to_fmp_symbol;
