mod common;

use common::{build_service, drifting_bars, last_close, temp_dir};
use predict_insight::domain::errors::PredictionError;
use predict_insight::domain::prediction::Action;
use predict_insight::infrastructure::ml::{BundlePaths, FsBundleLoader, JsonScaler};
use predict_insight::infrastructure::mock::{CountingBundleLoader, MockMarketDataService};
use std::sync::Arc;

#[tokio::test]
async fn test_uptrend_with_large_projected_gain_is_a_buy() {
    let bars = drifting_bars(120);
    let price = last_close(&bars);
    let provider = Arc::new(MockMarketDataService::new().with_bars("AAPL", bars));
    // Identity target scaler: the model's output is the price delta itself.
    let loader = Arc::new(CountingBundleLoader::new(price * 0.05));
    let (service, _) = build_service(provider, loader.clone());

    let result = service.predict(" aapl ").await.unwrap();

    assert_eq!(result.ticker, "AAPL");
    assert_eq!(result.action, Action::Buy);
    assert!((0.8..=2.0).contains(&result.threshold_pct));
    assert!(result.vol_pct > 1.0 && result.vol_pct < 2.0);
    let confidence = result.confidence.unwrap();
    assert!((0.55..=0.95).contains(&confidence));
    assert!((result.expected_return - 0.05).abs() < 1e-6);
    assert_eq!(loader.model().calls(), 1);
    assert_eq!(loader.model().last_input_shape(), Some((1, 30, 14)));
}

#[tokio::test]
async fn test_small_projection_holds() {
    let bars = drifting_bars(120);
    let price = last_close(&bars);
    let provider = Arc::new(MockMarketDataService::new().with_bars("MSFT", bars));
    let loader = Arc::new(CountingBundleLoader::new(-price * 0.001));
    let (service, _) = build_service(provider, loader);

    let result = service.predict("MSFT").await.unwrap();

    assert_eq!(result.action, Action::Hold);
    assert!(result.expected_return < 0.0);
}

#[tokio::test]
async fn test_short_history_fails_before_the_model_runs() {
    // 80 bars -> 79 rows -> 20 feature rows, below the lookback of 30.
    let provider = Arc::new(MockMarketDataService::new().with_bars("NEWCO", drifting_bars(80)));
    let loader = Arc::new(CountingBundleLoader::new(1.0));
    let (service, _) = build_service(provider, loader.clone());

    let err = service.predict("NEWCO").await.unwrap_err();

    assert!(matches!(
        err,
        PredictionError::InsufficientHistory {
            required: 30,
            available: 20,
            ..
        }
    ));
    assert_eq!(loader.model().calls(), 0);
}

#[tokio::test]
async fn test_unknown_ticker_is_no_data() {
    let provider = Arc::new(MockMarketDataService::new());
    let loader = Arc::new(CountingBundleLoader::new(1.0));
    let (service, _) = build_service(provider.clone(), loader);

    let err = service.predict("ZZZZ").await.unwrap_err();

    assert!(matches!(err, PredictionError::NoData { .. }));
    assert_eq!(provider.requested_ranges().len(), 2);
}

#[tokio::test]
async fn test_missing_bundle_file_is_reported_and_not_cached() {
    let dir = temp_dir("pipeline-bundles");
    let paths = BundlePaths::resolve(&dir, "AAPL");
    std::fs::write(&paths.model, b"onnx").unwrap();
    std::fs::write(&paths.meta, "{}").unwrap();
    let scaler = JsonScaler::standard(vec![0.0; 14], vec![1.0; 14]);
    std::fs::write(&paths.feature_scaler, serde_json::to_string(&scaler).unwrap()).unwrap();

    let provider = Arc::new(MockMarketDataService::new().with_bars("AAPL", drifting_bars(120)));
    let loader = Arc::new(FsBundleLoader::new(&dir));
    let (service, bundles) = build_service(provider.clone(), loader);

    let err = service.predict("AAPL").await.unwrap_err();

    match &err {
        PredictionError::BundleNotFound { missing, .. } => {
            assert_eq!(missing, &vec![paths.target_scaler.clone()]);
        }
        other => panic!("expected BundleNotFound, got {:?}", other),
    }
    assert!(err.to_string().contains("AAPL_target_scaler.json"));
    assert!(!bundles.is_cached("AAPL"));
    assert!(provider.requested_ranges().is_empty());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_market_data_failure_is_internal() {
    let provider = Arc::new(MockMarketDataService::new().failing("connection reset"));
    let loader = Arc::new(CountingBundleLoader::new(1.0));
    let (service, bundles) = build_service(provider, loader);

    let err = service.predict("AAPL").await.unwrap_err();

    assert!(matches!(err, PredictionError::MarketData(_)));
    // The bundle was loaded before the fetch and stays cached.
    assert!(bundles.is_cached("AAPL"));
}
