//! Configuration module for the prediction service.
//!
//! Settings are read from environment variables (optionally seeded from a
//! `.env` file by the binary), grouped by concern: Server, Model and Market Data.

mod market_data_config;
mod model_config;
mod server_config;

pub use market_data_config::MarketDataEnvConfig;
pub use model_config::ModelEnvConfig;
pub use server_config::ServerEnvConfig;

use anyhow::{Context, Result};
use std::env;

/// Variable lookup shared by the sub-configs, so tests need not touch the
/// process environment.
pub type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerEnvConfig,
    pub model: ModelEnvConfig,
    pub market_data: MarketDataEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: &Lookup<'_>) -> Result<Self> {
        let server = ServerEnvConfig::from_lookup(lookup);
        let model = ModelEnvConfig::from_lookup(lookup).context("Failed to load model config")?;
        let market_data = MarketDataEnvConfig::from_lookup(lookup)
            .context("Failed to load market data config")?;

        Ok(Self {
            server,
            model,
            market_data,
        })
    }
}
