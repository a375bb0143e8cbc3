use super::onnx_model::OnnxSequenceModel;
use super::scaler::JsonScaler;
use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::ml::bundle::{BundleMetadata, ModelBundle};
use crate::domain::ports::{BundleLoader, SequenceModel};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Builds a model from its artifact path.
pub type ModelFactory = fn(&Path) -> PipelineResult<Box<dyn SequenceModel>>;

/// The four artifact paths for one ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    pub model: PathBuf,
    pub feature_scaler: PathBuf,
    pub target_scaler: PathBuf,
    pub meta: PathBuf,
}

impl BundlePaths {
    pub fn resolve(dir: &Path, ticker: &str) -> Self {
        Self {
            model: dir.join(format!("{}_tcn_final.onnx", ticker)),
            feature_scaler: dir.join(format!("{}_feature_scaler.json", ticker)),
            target_scaler: dir.join(format!("{}_target_scaler.json", ticker)),
            meta: dir.join(format!("{}_meta.json", ticker)),
        }
    }

    /// Paths that do not exist as regular files, in declaration order.
    pub fn missing(&self) -> Vec<PathBuf> {
        [
            &self.model,
            &self.feature_scaler,
            &self.target_scaler,
            &self.meta,
        ]
        .into_iter()
        .filter(|p| !p.is_file())
        .cloned()
        .collect()
    }
}

fn load_onnx(path: &Path) -> PipelineResult<Box<dyn SequenceModel>> {
    Ok(Box::new(OnnxSequenceModel::load(path)?))
}

/// Loads bundles from a flat directory of `{TICKER}_*` artifacts.
pub struct FsBundleLoader {
    dir: PathBuf,
    model_factory: ModelFactory,
}

impl FsBundleLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            model_factory: load_onnx,
        }
    }

    /// Swap the ONNX runtime for another model implementation.
    pub fn with_model_factory(mut self, factory: ModelFactory) -> Self {
        self.model_factory = factory;
        self
    }
}

impl BundleLoader for FsBundleLoader {
    fn load(&self, ticker: &str) -> PipelineResult<ModelBundle> {
        let paths = BundlePaths::resolve(&self.dir, ticker);

        // Nothing is parsed unless all four files are present.
        let missing = paths.missing();
        if !missing.is_empty() {
            warn!(
                "FsBundleLoader: {} of 4 artifacts missing for {}",
                missing.len(),
                ticker
            );
            return Err(PredictionError::BundleNotFound {
                ticker: ticker.to_string(),
                missing,
            });
        }

        debug!("FsBundleLoader: loading bundle for {} from {:?}", ticker, self.dir);

        let meta_json = std::fs::read_to_string(&paths.meta).map_err(|e| {
            PredictionError::Internal(format!("failed to read {}: {}", paths.meta.display(), e))
        })?;
        let metadata = BundleMetadata::from_json(ticker, &meta_json)?;
        let feature_scaler = JsonScaler::load(&paths.feature_scaler)?;
        let target_scaler = JsonScaler::load(&paths.target_scaler)?;
        let model = (self.model_factory)(&paths.model)?;

        let bundle = ModelBundle::new(
            ticker,
            model,
            Box::new(feature_scaler),
            Box::new(target_scaler),
            metadata,
        )?;

        info!(
            "FsBundleLoader: loaded {} (lookback={}, features={})",
            bundle.ticker,
            bundle.metadata.lookback,
            bundle.metadata.feature_cols.len()
        );
        Ok(bundle)
    }
}
