use crate::application::decision_engine::DecisionEngine;
use crate::application::feature_engineering_service::engineer_features;
use crate::application::market_data::history_fetcher::HistoryFetcher;
use crate::application::ml::bundle_cache::BundleCache;
use crate::application::ml::inference_runner::InferenceRunner;
use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::prediction::{PredictionResult, round_to};
use std::sync::Arc;
use tracing::info;

pub const MAX_TICKER_LEN: usize = 10;

/// Symbols only: letters, digits and the `.^=-` used by class shares,
/// indices and futures. The ticker becomes part of a file name and a URL path.
fn is_ticker_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-')
}

/// Trim, length-check (1..=10 chars), restrict the character set and
/// uppercase a ticker.
pub fn normalize_ticker(raw: &str) -> PipelineResult<String> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_TICKER_LEN {
        return Err(PredictionError::InvalidTicker(format!(
            "ticker must be 1-{} characters, got {:?}",
            MAX_TICKER_LEN, raw
        )));
    }
    if !trimmed.chars().all(is_ticker_char) || trimmed.contains("..") {
        return Err(PredictionError::InvalidTicker(format!(
            "ticker may only contain letters, digits and '.^=-', got {:?}",
            raw
        )));
    }
    Ok(trimmed.to_uppercase())
}

/// Runs one prediction end to end:
/// bundle (cached) -> history -> features -> model -> decision.
pub struct PredictionService {
    bundles: Arc<BundleCache>,
    fetcher: HistoryFetcher,
    decision: DecisionEngine,
}

impl PredictionService {
    pub fn new(bundles: Arc<BundleCache>, fetcher: HistoryFetcher, decision: DecisionEngine) -> Self {
        Self {
            bundles,
            fetcher,
            decision,
        }
    }

    pub async fn predict(&self, raw_ticker: &str) -> PipelineResult<PredictionResult> {
        let ticker = normalize_ticker(raw_ticker)?;

        let bundle = self.bundles.get_or_load(&ticker).await?;
        let history = self.fetcher.fetch(&ticker).await?;
        let features = engineer_features(&history);

        let projection = InferenceRunner::run(&ticker, &features, &bundle)?;
        let decision = self
            .decision
            .evaluate(&ticker, &features, projection.expected_return)?;

        info!(
            "Prediction {}: action={} expected_return={:.6} threshold_pct={:.4} confidence={:.4}",
            ticker,
            decision.action,
            projection.expected_return,
            decision.threshold_pct,
            decision.confidence
        );

        Ok(PredictionResult {
            ticker,
            asof_date: projection.asof_date,
            current_price: round_to(projection.current_price, 4),
            pred_price_h: round_to(projection.pred_price, 4),
            delta_pred: round_to(projection.delta_pred, 4),
            expected_return: round_to(projection.expected_return, 6),
            threshold_pct: round_to(decision.threshold_pct, 4),
            vol_pct: round_to(decision.vol_pct, 4),
            action: decision.action,
            confidence: Some(decision.confidence),
        })
    }
}
