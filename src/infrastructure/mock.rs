//! In-memory stand-ins for the external collaborators, used by unit and
//! integration tests.

use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::market::types::{HistoryBar, HistoryRange};
use crate::domain::ml::bundle::{BundleMetadata, ModelBundle};
use crate::domain::ports::{BundleLoader, MarketDataService, Scaler, SequenceModel};
use async_trait::async_trait;
use ndarray::{Array2, Array3};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Serves canned bars per ticker and records every requested range.
#[derive(Default)]
pub struct MockMarketDataService {
    bars: HashMap<String, Vec<HistoryBar>>,
    empty_for_max: bool,
    failure: Option<String>,
    requests: Mutex<Vec<HistoryRange>>,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<HistoryBar>) -> Self {
        self.bars.insert(ticker.to_uppercase(), bars);
        self
    }

    /// Answer `HistoryRange::Max` with nothing, forcing the dated fallback.
    pub fn empty_for_max_range(mut self) -> Self {
        self.empty_for_max = true;
        self
    }

    /// Fail every request with a transport error.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn requested_ranges(&self) -> Vec<HistoryRange> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> PipelineResult<Vec<HistoryBar>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(range);
        }
        debug!("MockMarketDataService: {} {:?}", ticker, range);

        if let Some(message) = &self.failure {
            return Err(PredictionError::MarketData(message.clone()));
        }
        if self.empty_for_max && range == HistoryRange::Max {
            return Ok(Vec::new());
        }
        Ok(self
            .bars
            .get(&ticker.to_uppercase())
            .cloned()
            .unwrap_or_default())
    }
}

/// Always predicts the same scaled delta. Clones share their counters.
#[derive(Clone)]
pub struct FixedDeltaModel {
    delta: f64,
    calls: Arc<AtomicUsize>,
    last_shape: Arc<Mutex<Option<(usize, usize, usize)>>>,
}

impl FixedDeltaModel {
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            calls: Arc::new(AtomicUsize::new(0)),
            last_shape: Arc::new(Mutex::new(None)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input_shape(&self) -> Option<(usize, usize, usize)> {
        self.last_shape.lock().ok().and_then(|s| *s)
    }
}

impl SequenceModel for FixedDeltaModel {
    fn predict(&self, input: &Array3<f32>) -> PipelineResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut shape) = self.last_shape.lock() {
            *shape = Some(input.dim());
        }
        Ok(self.delta)
    }

    fn name(&self) -> &str {
        "fixed-delta"
    }
}

/// Pass-through scaler of a fixed width.
pub struct IdentityScaler {
    width: usize,
}

impl IdentityScaler {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    fn check(&self, input: &Array2<f64>) -> PipelineResult<()> {
        if input.ncols() != self.width {
            return Err(PredictionError::Scaler(format!(
                "expected {} columns, got {}",
                self.width,
                input.ncols()
            )));
        }
        Ok(())
    }
}

impl Scaler for IdentityScaler {
    fn n_features(&self) -> usize {
        self.width
    }

    fn transform(&self, input: &Array2<f64>) -> PipelineResult<Array2<f64>> {
        self.check(input)?;
        Ok(input.clone())
    }

    fn inverse_transform(&self, input: &Array2<f64>) -> PipelineResult<Array2<f64>> {
        self.check(input)?;
        Ok(input.clone())
    }
}

/// Builds identity-scaled bundles around a shared `FixedDeltaModel` and
/// counts loads per ticker.
pub struct CountingBundleLoader {
    model: FixedDeltaModel,
    metadata: BundleMetadata,
    missing: HashSet<String>,
    delay: Option<Duration>,
    loads: Mutex<HashMap<String, usize>>,
}

impl CountingBundleLoader {
    pub fn new(delta: f64) -> Self {
        Self {
            model: FixedDeltaModel::new(delta),
            metadata: BundleMetadata::default(),
            missing: HashSet::new(),
            delay: None,
            loads: Mutex::new(HashMap::new()),
        }
    }

    /// Report every artifact of `ticker` as absent.
    pub fn with_missing(mut self, ticker: &str) -> Self {
        self.missing.insert(ticker.to_uppercase());
        self
    }

    /// Block inside `load` to widen the window for concurrent callers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The model shared by every bundle this loader produces.
    pub fn model(&self) -> &FixedDeltaModel {
        &self.model
    }

    pub fn load_count(&self, ticker: &str) -> usize {
        self.loads
            .lock()
            .ok()
            .and_then(|loads| loads.get(&ticker.to_uppercase()).copied())
            .unwrap_or(0)
    }
}

impl BundleLoader for CountingBundleLoader {
    fn load(&self, ticker: &str) -> PipelineResult<ModelBundle> {
        if let Ok(mut loads) = self.loads.lock() {
            *loads.entry(ticker.to_uppercase()).or_insert(0) += 1;
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.missing.contains(&ticker.to_uppercase()) {
            return Err(PredictionError::BundleNotFound {
                ticker: ticker.to_string(),
                missing: vec![
                    PathBuf::from(format!("bundles/{}_tcn_final.onnx", ticker)),
                    PathBuf::from(format!("bundles/{}_feature_scaler.json", ticker)),
                    PathBuf::from(format!("bundles/{}_target_scaler.json", ticker)),
                    PathBuf::from(format!("bundles/{}_meta.json", ticker)),
                ],
            });
        }

        ModelBundle::new(
            ticker,
            Box::new(self.model.clone()),
            Box::new(IdentityScaler::new(self.metadata.feature_cols.len())),
            Box::new(IdentityScaler::new(1)),
            self.metadata.clone(),
        )
    }
}
