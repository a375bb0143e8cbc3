//! Column scalers exported from the training pipeline as JSON.
//!
//! Both variants follow scikit-learn semantics so exported `mean_`, `scale_`
//! and `min_` attributes can be dropped in unchanged.

use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::ports::Scaler;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JsonScaler {
    /// `x' = (x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x' = x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl JsonScaler {
    pub fn standard(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        JsonScaler::Standard { mean, scale }
    }

    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let scaler: JsonScaler = serde_json::from_str(json)
            .map_err(|e| PredictionError::Scaler(format!("invalid scaler JSON: {}", e)))?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PredictionError::Internal(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json).map_err(|e| match e {
            PredictionError::Scaler(msg) => {
                PredictionError::Scaler(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    fn validate(&self) -> PipelineResult<()> {
        let (offset, scale) = self.parts();
        if offset.is_empty() {
            return Err(PredictionError::Scaler("scaler has no columns".to_string()));
        }
        if offset.len() != scale.len() {
            return Err(PredictionError::Scaler(format!(
                "scaler parameter lengths differ: {} vs {}",
                offset.len(),
                scale.len()
            )));
        }
        if offset.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(PredictionError::Scaler(
                "scaler parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn parts(&self) -> (&[f64], &[f64]) {
        match self {
            JsonScaler::Standard { mean, scale } => (mean, scale),
            JsonScaler::MinMax { min, scale } => (min, scale),
        }
    }

    fn check_width(&self, input: &Array2<f64>) -> PipelineResult<()> {
        if input.ncols() != self.n_features() {
            return Err(PredictionError::Scaler(format!(
                "expected {} columns, got {}",
                self.n_features(),
                input.ncols()
            )));
        }
        Ok(())
    }
}

/// Zero scale means a constant column at fit time; sklearn leaves those unscaled.
fn safe_scale(s: f64) -> f64 {
    if s == 0.0 { 1.0 } else { s }
}

impl Scaler for JsonScaler {
    fn n_features(&self) -> usize {
        self.parts().0.len()
    }

    fn transform(&self, input: &Array2<f64>) -> PipelineResult<Array2<f64>> {
        self.check_width(input)?;
        let mut out = input.clone();
        for (j, mut col) in out.columns_mut().into_iter().enumerate() {
            match self {
                JsonScaler::Standard { mean, scale } => {
                    let s = safe_scale(scale[j]);
                    col.mapv_inplace(|x| (x - mean[j]) / s);
                }
                JsonScaler::MinMax { min, scale } => {
                    col.mapv_inplace(|x| x * scale[j] + min[j]);
                }
            }
        }
        Ok(out)
    }

    fn inverse_transform(&self, input: &Array2<f64>) -> PipelineResult<Array2<f64>> {
        self.check_width(input)?;
        let mut out = input.clone();
        for (j, mut col) in out.columns_mut().into_iter().enumerate() {
            match self {
                JsonScaler::Standard { mean, scale } => {
                    let s = safe_scale(scale[j]);
                    col.mapv_inplace(|x| x * s + mean[j]);
                }
                JsonScaler::MinMax { min, scale } => {
                    let s = safe_scale(scale[j]);
                    col.mapv_inplace(|x| (x - min[j]) / s);
                }
            }
        }
        Ok(out)
    }
}
