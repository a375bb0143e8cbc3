pub mod bundle_loader;
pub mod onnx_model;
pub mod scaler;

pub use bundle_loader::{BundlePaths, FsBundleLoader};
pub use onnx_model::OnnxSequenceModel;
pub use scaler::JsonScaler;
