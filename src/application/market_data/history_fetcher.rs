use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::market::types::{HistoryBar, HistoryRange, HistoryRow};
use crate::domain::ports::MarketDataService;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// Start date used when the "everything" query comes back empty.
pub fn default_fallback_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default()
}

/// Pulls raw daily bars for a ticker and normalizes them into [`HistoryRow`]s.
///
/// Nothing is cached between calls; every prediction refetches.
pub struct HistoryFetcher {
    provider: Arc<dyn MarketDataService>,
    fallback_start: NaiveDate,
}

impl HistoryFetcher {
    pub fn new(provider: Arc<dyn MarketDataService>, fallback_start: NaiveDate) -> Self {
        Self {
            provider,
            fallback_start,
        }
    }

    pub async fn fetch(&self, ticker: &str) -> PipelineResult<Vec<HistoryRow>> {
        let mut bars = self
            .provider
            .fetch_daily_history(ticker, HistoryRange::Max)
            .await?;

        if bars.is_empty() {
            info!(
                "HistoryFetcher: full history empty for {}, retrying from {}",
                ticker, self.fallback_start
            );
            bars = self
                .provider
                .fetch_daily_history(ticker, HistoryRange::Since(self.fallback_start))
                .await?;
        }

        if bars.is_empty() {
            return Err(PredictionError::NoData {
                ticker: ticker.to_string(),
            });
        }

        let raw_count = bars.len();
        let rows = normalize_history(bars);
        debug!(
            "HistoryFetcher: {} raw bars -> {} normalized rows for {}",
            raw_count,
            rows.len(),
            ticker
        );
        Ok(rows)
    }
}

/// Sort ascending by date, keep the last bar per date, derive `Chg%`,
/// and drop rows with unresolved values (always including the first row).
pub fn normalize_history(mut bars: Vec<HistoryBar>) -> Vec<HistoryRow> {
    bars.sort_by_key(|b| b.date);

    let mut unique: Vec<HistoryBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match unique.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => unique.push(bar),
        }
    }

    unique
        .windows(2)
        .filter_map(|pair| {
            let (prev, cur) = (&pair[0], &pair[1]);
            let chg_pct = (cur.close - prev.close) / prev.close * 100.0;
            let row = HistoryRow {
                date: cur.date,
                open: cur.open,
                high: cur.high,
                low: cur.low,
                price: cur.close,
                volume: cur.volume,
                chg_pct,
            };
            is_resolved(&row).then_some(row)
        })
        .collect()
}

fn is_resolved(row: &HistoryRow) -> bool {
    [
        row.open,
        row.high,
        row.low,
        row.price,
        row.volume,
        row.chg_pct,
    ]
    .iter()
    .all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MockMarketDataService;

    fn bar(day: u32, close: f64) -> HistoryBar {
        HistoryBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_normalize_sorts_and_drops_first_row() {
        let rows = normalize_history(vec![bar(3, 110.0), bar(1, 100.0), bar(2, 105.0)]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!((rows[0].chg_pct - 5.0).abs() < 1e-9);
        assert_eq!(rows[1].price, 110.0);
    }

    #[test]
    fn test_normalize_keeps_last_duplicate_date() {
        let rows = normalize_history(vec![bar(1, 100.0), bar(2, 90.0), bar(2, 120.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, 120.0);
    }

    #[test]
    fn test_normalize_drops_non_finite_rows() {
        let mut bad = bar(2, 101.0);
        bad.volume = f64::NAN;
        let rows = normalize_history(vec![bar(1, 100.0), bad, bar(3, 102.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[tokio::test]
    async fn test_falls_back_to_start_date_when_max_is_empty() {
        let provider = Arc::new(
            MockMarketDataService::new()
                .with_bars("AAPL", vec![bar(1, 100.0), bar(2, 101.0)])
                .empty_for_max_range(),
        );
        let fetcher = HistoryFetcher::new(provider.clone(), default_fallback_start());

        let rows = fetcher.fetch("AAPL").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            provider.requested_ranges(),
            vec![
                HistoryRange::Max,
                HistoryRange::Since(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap())
            ]
        );
    }

    #[tokio::test]
    async fn test_no_data_after_both_attempts() {
        let provider = Arc::new(MockMarketDataService::new());
        let fetcher = HistoryFetcher::new(provider.clone(), default_fallback_start());

        let err = fetcher.fetch("NOPE").await.unwrap_err();
        assert!(matches!(err, PredictionError::NoData { .. }));
        assert_eq!(provider.requested_ranges().len(), 2);
    }
}
