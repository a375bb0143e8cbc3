use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::ml::feature_registry::{DEFAULT_FEATURE_COLUMNS, FeatureColumn};
use crate::domain::ports::{Scaler, SequenceModel};
use serde::Deserialize;
use std::collections::HashSet;

pub const DEFAULT_LOOKBACK: usize = 30;

/// `{TICKER}_meta.json` as written by the training job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBundleMetadata {
    pub lookback: Option<i64>,
    pub feature_cols: Option<Vec<String>>,
}

/// Validated bundle metadata. Column order is the training-time order.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleMetadata {
    pub lookback: usize,
    pub feature_cols: Vec<FeatureColumn>,
}

impl Default for BundleMetadata {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            feature_cols: DEFAULT_FEATURE_COLUMNS.to_vec(),
        }
    }
}

impl BundleMetadata {
    /// Resolve defaults and reject unknown, duplicate or empty column lists.
    pub fn from_raw(ticker: &str, raw: RawBundleMetadata) -> PipelineResult<Self> {
        let invalid = |reason: String| PredictionError::InvalidMetadata {
            ticker: ticker.to_string(),
            reason,
        };

        let lookback = match raw.lookback {
            None => DEFAULT_LOOKBACK,
            Some(n) if n >= 1 => n as usize,
            Some(n) => return Err(invalid(format!("lookback must be >= 1, got {}", n))),
        };

        let feature_cols = match raw.feature_cols {
            None => DEFAULT_FEATURE_COLUMNS.to_vec(),
            Some(names) => {
                if names.is_empty() {
                    return Err(invalid("feature_cols is empty".to_string()));
                }
                let mut seen = HashSet::new();
                let mut cols = Vec::with_capacity(names.len());
                for name in &names {
                    let col = name.parse::<FeatureColumn>().map_err(invalid)?;
                    if !seen.insert(col) {
                        return Err(invalid(format!("duplicate feature column '{}'", name)));
                    }
                    cols.push(col);
                }
                cols
            }
        };

        Ok(Self {
            lookback,
            feature_cols,
        })
    }

    pub fn from_json(ticker: &str, json: &str) -> PipelineResult<Self> {
        let raw: RawBundleMetadata =
            serde_json::from_str(json).map_err(|e| PredictionError::InvalidMetadata {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_raw(ticker, raw)
    }
}

/// Everything needed to score one ticker. Immutable once built.
pub struct ModelBundle {
    pub ticker: String,
    pub model: Box<dyn SequenceModel>,
    pub feature_scaler: Box<dyn Scaler>,
    pub target_scaler: Box<dyn Scaler>,
    pub metadata: BundleMetadata,
}

impl ModelBundle {
    /// Assemble a bundle, checking that both scalers agree with the metadata.
    pub fn new(
        ticker: &str,
        model: Box<dyn SequenceModel>,
        feature_scaler: Box<dyn Scaler>,
        target_scaler: Box<dyn Scaler>,
        metadata: BundleMetadata,
    ) -> PipelineResult<Self> {
        if feature_scaler.n_features() != metadata.feature_cols.len() {
            return Err(PredictionError::InvalidMetadata {
                ticker: ticker.to_string(),
                reason: format!(
                    "feature scaler expects {} columns but metadata lists {}",
                    feature_scaler.n_features(),
                    metadata.feature_cols.len()
                ),
            });
        }
        if target_scaler.n_features() != 1 {
            return Err(PredictionError::InvalidMetadata {
                ticker: ticker.to_string(),
                reason: format!(
                    "target scaler must have one column, has {}",
                    target_scaler.n_features()
                ),
            });
        }

        Ok(Self {
            ticker: ticker.to_uppercase(),
            model,
            feature_scaler,
            target_scaler,
            metadata,
        })
    }
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("ticker", &self.ticker)
            .field("model", &self.model.name())
            .field("metadata", &self.metadata)
            .finish()
    }
}
