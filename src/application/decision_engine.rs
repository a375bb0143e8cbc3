use crate::application::feature_engineering_service::rolling_std;
use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::market::types::FeatureRow;
use crate::domain::prediction::{Action, round_to};

const CONFIDENCE_FLOOR: f64 = 0.55;
const CONFIDENCE_CEIL: f64 = 0.95;
const CONFIDENCE_SLOPE: f64 = 0.2;
const MAX_THRESHOLD_MULTIPLE: f64 = 2.0;

/// Threshold band and volatility window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionConfig {
    pub min_threshold_pct: f64,
    pub max_threshold_pct: f64,
    pub vol_window: usize,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            min_threshold_pct: 0.8,
            max_threshold_pct: 2.0,
            vol_window: 14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: Action,
    /// Clamped threshold, in percent.
    pub threshold_pct: f64,
    /// Same threshold as a fraction of price.
    pub threshold_fraction: f64,
    /// Unclamped realized volatility, in percent.
    pub vol_pct: f64,
    pub confidence: f64,
}

/// Maps an expected return to BUY/SELL/HOLD using a volatility-adaptive threshold.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(
        &self,
        ticker: &str,
        rows: &[FeatureRow],
        expected_return: f64,
    ) -> PipelineResult<Decision> {
        let vol_pct = self.realized_volatility_pct(rows).ok_or_else(|| {
            PredictionError::InsufficientHistory {
                ticker: ticker.to_string(),
                required: self.config.vol_window,
                available: rows.len(),
            }
        })?;

        let threshold_pct = self.threshold_pct(vol_pct);
        let threshold_fraction = threshold_pct / 100.0;

        Ok(Decision {
            action: decide(expected_return, threshold_fraction),
            threshold_pct,
            threshold_fraction,
            vol_pct,
            confidence: confidence(expected_return, threshold_fraction),
        })
    }

    /// Trailing standard deviation of `ret_1d` over `vol_window`, in percent,
    /// taken at the last row.
    pub fn realized_volatility_pct(&self, rows: &[FeatureRow]) -> Option<f64> {
        let window = self.config.vol_window;
        if rows.len() < window {
            return None;
        }
        let returns: Vec<Option<f64>> = rows[rows.len() - window..]
            .iter()
            .map(|r| Some(r.ret_1d))
            .collect();
        rolling_std(&returns, window)
            .last()
            .copied()
            .flatten()
            .map(|std| std * 100.0)
    }

    /// Realized volatility clamped into the configured band.
    pub fn threshold_pct(&self, vol_pct: f64) -> f64 {
        self.config
            .min_threshold_pct
            .max(self.config.max_threshold_pct.min(vol_pct))
    }
}

/// BUY at or above +threshold, SELL at or below -threshold, HOLD in between.
pub fn decide(expected_return: f64, threshold_fraction: f64) -> Action {
    if expected_return >= threshold_fraction {
        Action::Buy
    } else if expected_return <= -threshold_fraction {
        Action::Sell
    } else {
        Action::Hold
    }
}

/// 0.55 at zero, rising linearly and saturating at 0.95 from twice the threshold.
pub fn confidence(expected_return: f64, threshold_fraction: f64) -> f64 {
    let ratio = expected_return.abs() / threshold_fraction.max(1e-6);
    let raw = CONFIDENCE_FLOOR + ratio.min(MAX_THRESHOLD_MULTIPLE) * CONFIDENCE_SLOPE;
    round_to(raw.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEIL), 4)
}
