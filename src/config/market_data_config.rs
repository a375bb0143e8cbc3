//! Upstream history provider settings.

use super::Lookup;
use crate::application::market_data::history_fetcher::default_fallback_start;
use crate::infrastructure::yahoo::market_data::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;

/// Market data environment configuration
#[derive(Debug, Clone)]
pub struct MarketDataEnvConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub fallback_start: NaiveDate,
}

impl MarketDataEnvConfig {
    pub(super) fn from_lookup(lookup: &Lookup<'_>) -> Result<Self> {
        let fallback_start = match lookup("HISTORY_FALLBACK_START") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("Failed to parse HISTORY_FALLBACK_START '{}'", raw))?,
            None => default_fallback_start(),
        };

        Ok(Self {
            base_url: lookup("MARKET_DATA_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                lookup("MARKET_DATA_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|s| *s > 0)
                    .unwrap_or(15),
            ),
            connect_timeout: Duration::from_secs(
                lookup("MARKET_DATA_CONNECT_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|s| *s > 0)
                    .unwrap_or(5),
            ),
            fallback_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_defaults() {
        let config = MarketDataEnvConfig::from_lookup(&|_| None).unwrap();
        assert_eq!(config.base_url, "https://query1.finance.yahoo.com");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.fallback_start, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
    }

    #[test]
    fn test_bad_fallback_date_is_an_error() {
        let result = MarketDataEnvConfig::from_lookup(&|k| {
            (k == "HISTORY_FALLBACK_START").then(|| "01/01/2010".to_string())
        });
        assert!(result.is_err());
    }
}
