use common::{ChartDataPoint, DateRange, HistoryStats};

const SECONDS_PER_DAY: f64 = 86_400.0;

pub const SOURCE_INTRADAY: &str = "FMP Extended Intraday";
pub const SOURCE_EOD: &str = "FMP Extended EOD";

/// How prices in a series are rounded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Always 2 decimals.
    Cents,
    /// 6 decimals below 1, otherwise 2. Used for crypto pairs.
    Adaptive,
}

impl Precision {
    pub fn round(self, value: f64) -> f64 {
        let decimals = match self {
            Precision::Adaptive if value.abs() < 1.0 => 6,
            _ => 2,
        };
        round_to(value, decimals)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn timeframe_label(days: u32) -> &'static str {
    match days {
        1 => "1 day (extended)",
        7 => "1 week (extended)",
        30 => "1 month (extended)",
        _ => "3 months (extended)",
    }
}

/// Inputs to [`summarize`] that do not come from the points themselves.
#[derive(Debug, Clone)]
pub struct SeriesContext<'a> {
    pub symbol: &'a str,
    pub requested_days: u32,
    pub is_intraday: bool,
    pub original_count: usize,
    pub cached: bool,
    pub precision: Precision,
}

/// Summary statistics over a non-empty, ascending series.
///
/// Returns `None` for an empty series.
pub fn summarize(points: &[ChartDataPoint], ctx: &SeriesContext<'_>) -> Option<HistoryStats> {
    let first = points.first()?;
    let last = points.last()?;

    let (min, max, sum) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), p| (min.min(p.price), max.max(p.price), sum + p.price),
    );
    let avg = sum / points.len() as f64;
    let span = (last.timestamp - first.timestamp) as f64;

    Some(HistoryStats {
        min: ctx.precision.round(min),
        max: ctx.precision.round(max),
        avg: ctx.precision.round(avg),
        count: points.len(),
        original_count: ctx.original_count,
        actual_days_range: (span / SECONDS_PER_DAY).ceil() as i64,
        requested_days: ctx.requested_days,
        interval: if ctx.is_intraday {
            "hourly/intraday".into()
        } else {
            "daily".into()
        },
        timeframe: timeframe_label(ctx.requested_days).into(),
        cached: ctx.cached,
        source: if ctx.is_intraday {
            SOURCE_INTRADAY.into()
        } else {
            SOURCE_EOD.into()
        },
        symbol: ctx.symbol.to_string(),
        is_intraday: ctx.is_intraday,
        date_range: DateRange {
            from: first.full_date.clone(),
            to: last.full_date.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(timestamp: i64, price: f64, full_date: &str) -> ChartDataPoint {
        ChartDataPoint {
            timestamp,
            date: String::new(),
            price,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
            time_format: String::new(),
            full_date: full_date.into(),
        }
    }

    fn ctx(precision: Precision) -> SeriesContext<'static> {
        SeriesContext {
            symbol: "AAPL",
            requested_days: 7,
            is_intraday: false,
            original_count: 90,
            cached: true,
            precision,
        }
    }

    #[test]
    fn test_summarize_basic() {
        let points = vec![
            point(1_704_067_200, 10.0, "1/1/2024, 12:00:00 AM"),
            point(1_704_153_600, 20.004, "1/2/2024, 12:00:00 AM"),
            point(1_704_196_800, 12.5, "1/2/2024, 12:00:00 PM"),
        ];

        let stats = summarize(&points, &ctx(Precision::Cents)).unwrap();

        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 20.0);
        assert_eq!(stats.avg, 14.17);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.original_count, 90);
        // 1.5 days rounds up.
        assert_eq!(stats.actual_days_range, 2);
        assert_eq!(stats.interval, "daily");
        assert_eq!(stats.timeframe, "1 week (extended)");
        assert_eq!(stats.source, SOURCE_EOD);
        assert!(stats.cached);
        assert_eq!(stats.date_range.from, "1/1/2024, 12:00:00 AM");
        assert_eq!(stats.date_range.to, "1/2/2024, 12:00:00 PM");
    }

    #[test]
    fn test_adaptive_precision_for_small_prices() {
        let points = vec![point(1, 0.123_456_78, ""), point(2, 0.2, "")];
        let stats = summarize(&points, &ctx(Precision::Adaptive)).unwrap();
        assert_eq!(stats.min, 0.123457);

        let stats = summarize(&points, &ctx(Precision::Cents)).unwrap();
        assert_eq!(stats.min, 0.12);
    }

    #[test]
    fn test_empty_series_has_no_stats() {
        assert!(summarize(&[], &ctx(Precision::Cents)).is_none());
    }

    #[test]
    fn test_timeframe_labels() {
        assert_eq!(timeframe_label(1), "1 day (extended)");
        assert_eq!(timeframe_label(30), "1 month (extended)");
        assert_eq!(timeframe_label(90), "3 months (extended)");
        assert_eq!(timeframe_label(365), "3 months (extended)");
    }
}
