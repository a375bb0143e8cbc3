use std::path::PathBuf;
use thiserror::Error;

/// Outward-facing class of a prediction failure.
///
/// Each category maps to exactly one response status at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The bundle for the ticker has not been provisioned on disk.
    BundleUnavailable,
    /// Caller-correctable: unknown ticker, too little history, bad input.
    BadRequest,
    /// Anything else: model, scaler, metadata or transport failures.
    Internal,
}

/// Errors raised by the prediction pipeline.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Missing bundle files for {ticker}: {}", format_paths(.missing))]
    BundleNotFound {
        ticker: String,
        missing: Vec<PathBuf>,
    },

    #[error("No data returned for ticker {ticker}.")]
    NoData { ticker: String },

    #[error("Not enough data for {ticker}. Need at least {required} rows, got {available}.")]
    InsufficientHistory {
        ticker: String,
        required: usize,
        available: usize,
    },

    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Invalid bundle metadata for {ticker}: {reason}")]
    InvalidMetadata { ticker: String, reason: String },

    #[error("Scaler error: {0}")]
    Scaler(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("{0}")]
    Internal(String),
}

impl PredictionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BundleNotFound { .. } => ErrorCategory::BundleUnavailable,
            Self::NoData { .. } | Self::InsufficientHistory { .. } | Self::InvalidTicker(_) => {
                ErrorCategory::BadRequest
            }
            Self::InvalidMetadata { .. }
            | Self::Scaler(_)
            | Self::Model(_)
            | Self::MarketData(_)
            | Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    let quoted: Vec<String> = paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

pub type PipelineResult<T> = Result<T, PredictionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_not_found_lists_every_path() {
        let err = PredictionError::BundleNotFound {
            ticker: "AAPL".to_string(),
            missing: vec![
                PathBuf::from("bundles/AAPL_meta.json"),
                PathBuf::from("bundles/AAPL_target_scaler.json"),
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("AAPL_meta.json"));
        assert!(msg.contains("AAPL_target_scaler.json"));
        assert_eq!(err.category(), ErrorCategory::BundleUnavailable);
    }

    #[test]
    fn test_categories() {
        let no_data = PredictionError::NoData {
            ticker: "ZZZZ".to_string(),
        };
        let short = PredictionError::InsufficientHistory {
            ticker: "NEWCO".to_string(),
            required: 30,
            available: 12,
        };
        assert_eq!(no_data.category(), ErrorCategory::BadRequest);
        assert_eq!(short.category(), ErrorCategory::BadRequest);
        assert!(short.to_string().contains("Need at least 30 rows"));

        let model = PredictionError::Model("shape mismatch".to_string());
        assert_eq!(model.category(), ErrorCategory::Internal);
    }
}
