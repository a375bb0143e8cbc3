// Daily history retrieval
pub mod market_data;

// Indicator derivation
pub mod feature_engineering_service;

// Bundle cache and model scoring
pub mod ml;

// Threshold and action selection
pub mod decision_engine;

// Request pipeline orchestrator
pub mod prediction_service;
