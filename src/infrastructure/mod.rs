// Shared HTTP plumbing
pub mod core;

// Yahoo Finance chart API
pub mod yahoo;

// On-disk model bundles (ONNX + JSON scalers)
pub mod ml;

// Test doubles
pub mod mock;
