use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::ports::SequenceModel;
use ndarray::Array3;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};

/// Pre-trained temporal convolution network exported to ONNX.
pub struct OnnxSequenceModel {
    session: Mutex<Session>,
    /// Set when the graph has exactly one input, which is then fed by name.
    input_name: Option<String>,
    model_path: PathBuf,
}

impl OnnxSequenceModel {
    pub fn load(model_path: &Path) -> PipelineResult<Self> {
        let session = Session::builder()
            .and_then(|mut builder| builder.commit_from_file(model_path))
            .map_err(|e| {
                error!("Failed to load ONNX model from {:?}: {}", model_path, e);
                PredictionError::Model(format!(
                    "failed to load {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        let input_name = match session.inputs() {
            [only] => Some(only.name().to_string()),
            _ => None,
        };

        info!(
            "Successfully loaded ONNX model from {:?} (inputs={}, named={:?})",
            model_path,
            session.inputs().len(),
            input_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            model_path: model_path.to_path_buf(),
        })
    }
}

impl SequenceModel for OnnxSequenceModel {
    fn predict(&self, input: &Array3<f32>) -> PipelineResult<f64> {
        let (batch, steps, channels) = input.dim();
        let shape = vec![batch, steps, channels];
        let flat_data: Vec<f32> = input.iter().copied().collect();

        let input_value = ort::value::Value::from_array((shape.as_slice(), flat_data))
            .map_err(|e| PredictionError::Model(format!("Input value creation failed: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PredictionError::Model(format!("Session lock failed: {}", e)))?;

        let outputs = match &self.input_name {
            Some(name) => session.run(ort::inputs![name.as_str() => input_value]),
            None => session.run(ort::inputs![input_value]),
        }
        .map_err(|e| PredictionError::Model(format!("Inference failed: {}", e)))?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| PredictionError::Model("No output found".to_string()))?;
        let data = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| PredictionError::Model(e.to_string()))?;
        let value = data
            .1
            .iter()
            .next()
            .copied()
            .ok_or_else(|| PredictionError::Model("Empty output".to_string()))?;

        Ok(value as f64)
    }

    fn name(&self) -> &str {
        self.model_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("onnx")
    }
}
