// Market data domain
pub mod market;

// Model bundles and feature columns
pub mod ml;

// Port interfaces
pub mod ports;

// Prediction outcome types
pub mod prediction;

// Domain-specific error types
pub mod errors;
