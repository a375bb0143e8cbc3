use super::common::ChartEnvelope;
use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::market::types::{HistoryBar, HistoryRange};
use crate::domain::ports::MarketDataService;
use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, warn};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Daily bars from the Yahoo Finance v8 chart endpoint.
pub struct YahooMarketDataService {
    client: Client,
    base_url: String,
}

impl YahooMarketDataService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn query_params(range: HistoryRange) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
            ("includeAdjustedClose", "false".to_string()),
        ];
        match range {
            HistoryRange::Max => params.push(("range", "max".to_string())),
            HistoryRange::Since(start) => {
                let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
                params.push(("period1", period1.to_string()));
                params.push(("period2", Utc::now().timestamp().to_string()));
            }
        }
        params
    }
}

#[async_trait]
impl MarketDataService for YahooMarketDataService {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> PipelineResult<Vec<HistoryBar>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let params = Self::query_params(range);

        debug!(
            "YahooMarketDataService: Fetching daily bars for {} ({:?}) from {}",
            ticker, range, url
        );

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("YahooMarketDataService: request for {} timed out", ticker);
                    PredictionError::MarketData(format!("history request for {} timed out", ticker))
                } else {
                    error!("YahooMarketDataService: request for {} failed: {}", ticker, e);
                    PredictionError::MarketData(format!("history request for {} failed: {}", ticker, e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("YahooMarketDataService: no chart for {}", ticker);
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                "YahooMarketDataService: history fetch for {} failed ({}): {}",
                ticker, status, body
            );
            return Err(PredictionError::MarketData(format!(
                "history request for {} returned {}",
                ticker, status
            )));
        }

        let envelope: ChartEnvelope = response.json().await.map_err(|e| {
            PredictionError::MarketData(format!("malformed chart payload for {}: {}", ticker, e))
        })?;

        if let Some(err) = &envelope.chart.error {
            warn!(
                "YahooMarketDataService: chart error for {}: {} {}",
                ticker, err.code, err.description
            );
        }

        let bars = envelope.into_bars();
        debug!(
            "YahooMarketDataService: received {} bars for {}",
            bars.len(),
            ticker
        );
        Ok(bars)
    }
}
