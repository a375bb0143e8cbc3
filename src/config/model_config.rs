//! Bundle location and decision-threshold settings.

use super::Lookup;
use crate::application::decision_engine::DecisionConfig;
use anyhow::Result;
use std::path::PathBuf;

/// Model environment configuration
#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub bundle_dir: PathBuf,
    pub min_threshold_pct: f64,
    pub max_threshold_pct: f64,
    pub vol_window: usize,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            bundle_dir: PathBuf::from("./bundles"),
            min_threshold_pct: 0.8,
            max_threshold_pct: 2.0,
            vol_window: 14,
        }
    }
}

impl ModelEnvConfig {
    pub(super) fn from_lookup(lookup: &Lookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            bundle_dir: lookup("BUNDLE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.bundle_dir),
            min_threshold_pct: lookup("MIN_TH_PCT")
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(defaults.min_threshold_pct),
            max_threshold_pct: lookup("MAX_TH_PCT")
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(defaults.max_threshold_pct),
            vol_window: lookup("VOL_WINDOW")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.vol_window),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_threshold_pct > 0.0 && self.max_threshold_pct > 0.0) {
            anyhow::bail!(
                "MIN_TH_PCT and MAX_TH_PCT must be positive, got {} and {}",
                self.min_threshold_pct,
                self.max_threshold_pct
            );
        }
        if self.min_threshold_pct > self.max_threshold_pct {
            anyhow::bail!(
                "MIN_TH_PCT ({}) must not exceed MAX_TH_PCT ({})",
                self.min_threshold_pct,
                self.max_threshold_pct
            );
        }
        if self.vol_window < 2 {
            anyhow::bail!("VOL_WINDOW must be at least 2, got {}", self.vol_window);
        }
        Ok(())
    }

    pub fn decision_config(&self) -> DecisionConfig {
        DecisionConfig {
            min_threshold_pct: self.min_threshold_pct,
            max_threshold_pct: self.max_threshold_pct,
            vol_window: self.vol_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ModelEnvConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ModelEnvConfig::from_lookup(&|k| vars.get(k).cloned())
    }

    #[test]
    fn test_model_config_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bundle_dir, PathBuf::from("./bundles"));
        assert_eq!(config.min_threshold_pct, 0.8);
        assert_eq!(config.max_threshold_pct, 2.0);
        assert_eq!(config.vol_window, 14);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = load(&[("MIN_TH_PCT", "abc"), ("VOL_WINDOW", "-3")]).unwrap();
        assert_eq!(config.min_threshold_pct, 0.8);
        assert_eq!(config.vol_window, 14);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = load(&[("MIN_TH_PCT", "3.0"), ("MAX_TH_PCT", "1.0")]).unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn test_non_positive_bound_and_short_window_rejected() {
        assert!(load(&[("MIN_TH_PCT", "0")]).is_err());
        assert!(load(&[("VOL_WINDOW", "1")]).is_err());
    }
}
