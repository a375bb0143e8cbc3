//! HTTP listener and authentication settings.

use super::Lookup;

/// Server environment configuration
#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    /// Bearer token required on `/predict`. Empty disables authentication.
    pub api_key: String,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8001,
            api_key: String::new(),
        }
    }
}

impl ServerEnvConfig {
    pub(super) fn from_lookup(lookup: &Lookup<'_>) -> Self {
        Self {
            bind_address: lookup("SERVER_BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("SERVER_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8001),
            // Compared byte for byte; surrounding whitespace is part of the key.
            api_key: lookup("ML_API_KEY").unwrap_or_default(),
        }
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
