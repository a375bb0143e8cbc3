use crate::application::prediction_service::PredictionService;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state behind every handler.
pub struct AppState {
    pub service: Arc<PredictionService>,
    /// Reported by `/health`; the loader owns the path it actually reads.
    pub bundle_dir: PathBuf,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>, bundle_dir: PathBuf) -> Self {
        Self {
            service,
            bundle_dir,
        }
    }
}
