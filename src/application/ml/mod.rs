pub mod bundle_cache;
pub mod inference_runner;

pub use bundle_cache::BundleCache;
pub use inference_runner::{InferenceRunner, PriceProjection};
