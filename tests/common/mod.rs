#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use predict_insight::application::decision_engine::{DecisionConfig, DecisionEngine};
use predict_insight::application::market_data::HistoryFetcher;
use predict_insight::application::market_data::history_fetcher::default_fallback_start;
use predict_insight::application::ml::BundleCache;
use predict_insight::application::prediction_service::PredictionService;
use predict_insight::domain::market::types::HistoryBar;
use predict_insight::domain::ports::{BundleLoader, MarketDataService};
use std::path::PathBuf;
use std::sync::Arc;

/// Daily bars alternating +2.5% / -0.5%: mean drift +1%/day, ~1.5% volatility.
pub fn drifting_bars(days: usize) -> Vec<HistoryBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut price = 100.0;
    (0..days)
        .map(|i| {
            if i > 0 {
                price *= if i % 2 == 1 { 1.025 } else { 0.995 };
            }
            HistoryBar {
                date: start + Duration::days(i as i64),
                open: price * 0.998,
                high: price * 1.01,
                low: price * 0.99,
                close: price,
                volume: 1_000_000.0 + i as f64,
            }
        })
        .collect()
}

pub fn last_close(bars: &[HistoryBar]) -> f64 {
    bars.last().map(|b| b.close).unwrap_or_default()
}

pub fn build_service(
    provider: Arc<dyn MarketDataService>,
    loader: Arc<dyn BundleLoader>,
) -> (Arc<PredictionService>, Arc<BundleCache>) {
    let bundles = Arc::new(BundleCache::new(loader));
    let fetcher = HistoryFetcher::new(provider, default_fallback_start());
    let decision = DecisionEngine::new(DecisionConfig::default());
    let service = Arc::new(PredictionService::new(bundles.clone(), fetcher, decision));
    (service, bundles)
}

pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
