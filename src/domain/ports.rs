use crate::domain::errors::PipelineResult;
use crate::domain::market::types::{HistoryBar, HistoryRange};
use crate::domain::ml::bundle::ModelBundle;
use async_trait::async_trait;
use ndarray::{Array2, Array3};

// Need async_trait for async functions in traits
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Daily bars for `ticker`. An unknown ticker yields an empty vector,
    /// not an error.
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> PipelineResult<Vec<HistoryBar>>;
}

/// Pre-trained sequence model: `[batch=1, time, channels]` in, one scaled delta out.
pub trait SequenceModel: Send + Sync {
    fn predict(&self, input: &Array3<f32>) -> PipelineResult<f64>;

    fn name(&self) -> &str;
}

/// Column-wise scaler fitted at training time.
pub trait Scaler: Send + Sync {
    /// Number of columns the scaler was fitted on.
    fn n_features(&self) -> usize;

    fn transform(&self, input: &Array2<f64>) -> PipelineResult<Array2<f64>>;

    fn inverse_transform(&self, input: &Array2<f64>) -> PipelineResult<Array2<f64>>;

    /// Inverse-transform a single value of a one-column scaler.
    fn inverse_transform_scalar(&self, value: f64) -> PipelineResult<f64> {
        let restored = self.inverse_transform(&Array2::from_elem((1, 1), value))?;
        Ok(restored[[0, 0]])
    }
}

/// Reads one ticker's artifacts into memory. Blocking.
pub trait BundleLoader: Send + Sync {
    fn load(&self, ticker: &str) -> PipelineResult<ModelBundle>;
}
