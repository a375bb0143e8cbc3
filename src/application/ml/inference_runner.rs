use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::market::types::FeatureRow;
use crate::domain::ml::bundle::ModelBundle;
use crate::domain::ml::feature_registry::FeatureColumn;
use chrono::NaiveDate;
use ndarray::{Array2, Axis};
use tracing::debug;

/// Model output converted back into price space, at full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceProjection {
    pub asof_date: NaiveDate,
    pub current_price: f64,
    pub delta_pred: f64,
    pub pred_price: f64,
    pub expected_return: f64,
}

/// Scores the trailing lookback window of a ticker's feature rows.
pub struct InferenceRunner;

impl InferenceRunner {
    pub fn run(
        ticker: &str,
        rows: &[FeatureRow],
        bundle: &ModelBundle,
    ) -> PipelineResult<PriceProjection> {
        let lookback = bundle.metadata.lookback;
        if rows.len() < lookback {
            return Err(PredictionError::InsufficientHistory {
                ticker: ticker.to_string(),
                required: lookback,
                available: rows.len(),
            });
        }

        let window = &rows[rows.len() - lookback..];
        let columns = &bundle.metadata.feature_cols;
        let features = window_matrix(window, columns);

        let scaled = bundle.feature_scaler.transform(&features)?;
        if scaled.dim() != features.dim() {
            return Err(PredictionError::Scaler(format!(
                "feature scaler returned shape {:?}, expected {:?}",
                scaled.dim(),
                features.dim()
            )));
        }

        // [lookback, n_features] -> [1, lookback, n_features]
        let input = scaled.mapv(|v| v as f32).insert_axis(Axis(0));

        let delta_scaled = bundle.model.predict(&input)?;
        let delta_pred = bundle.target_scaler.inverse_transform_scalar(delta_scaled)?;
        if !delta_pred.is_finite() {
            return Err(PredictionError::Model(format!(
                "non-finite delta {} from {}",
                delta_pred,
                bundle.model.name()
            )));
        }

        let last = &window[window.len() - 1];
        let current_price = last.price;
        if current_price == 0.0 {
            return Err(PredictionError::Internal(format!(
                "current price for {} is zero",
                ticker
            )));
        }

        let pred_price = current_price + delta_pred;
        let expected_return = delta_pred / current_price;

        debug!(
            "InferenceRunner: {} scaled_delta={:.6} delta={:.6} expected_return={:.6}",
            ticker, delta_scaled, delta_pred, expected_return
        );

        Ok(PriceProjection {
            asof_date: last.date,
            current_price,
            delta_pred,
            pred_price,
            expected_return,
        })
    }
}

/// Dense `[rows, columns]` matrix in metadata column order.
fn window_matrix(window: &[FeatureRow], columns: &[FeatureColumn]) -> Array2<f64> {
    Array2::from_shape_fn((window.len(), columns.len()), |(i, j)| {
        columns[j].value(&window[i])
    })
}
