use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::governor::PricingTable;
use crate::{Error, Result};

/// Limits enforced by the economic governor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Maximum spend per sliding hour, in currency units.
    pub max_cost_per_hour: f64,
    pub max_requests_per_hour: u32,
    /// How long the circuit stays open before a probationary call.
    pub cooldown_minutes: u32,
    /// Utilisation ratio (0-1] above which calls are allowed with a warning.
    pub warning_threshold: f64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_cost_per_hour: 10.0,
            max_requests_per_hour: 100,
            cooldown_minutes: 15,
            warning_threshold: 0.8,
        }
    }
}

impl GovernorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_cost_per_hour > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_cost_per_hour must be positive, got {}",
                self.max_cost_per_hour
            )));
        }
        if self.max_requests_per_hour == 0 {
            return Err(Error::InvalidConfig(
                "max_requests_per_hour must be positive".to_string(),
            ));
        }
        if !(self.warning_threshold > 0.0 && self.warning_threshold <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "warning_threshold must be in (0, 1], got {}",
                self.warning_threshold
            )));
        }
        Ok(())
    }

    /// Overlay `MAX_COST_PER_HOUR`, `MAX_REQUESTS_PER_HOUR`,
    /// `COOLDOWN_MINUTES` and `WARNING_THRESHOLD` from the process
    /// environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MAX_COST_PER_HOUR") {
            self.max_cost_per_hour = parse_var("MAX_COST_PER_HOUR", &value)?;
        }
        if let Some(value) = lookup("MAX_REQUESTS_PER_HOUR") {
            self.max_requests_per_hour = parse_var("MAX_REQUESTS_PER_HOUR", &value)?;
        }
        if let Some(value) = lookup("COOLDOWN_MINUTES") {
            self.cooldown_minutes = parse_var("COOLDOWN_MINUTES", &value)?;
        }
        if let Some(value) = lookup("WARNING_THRESHOLD") {
            self.warning_threshold = parse_var("WARNING_THRESHOLD", &value)?;
        }
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{}={:?} is not a valid value", key, value)))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub governor: GovernorConfig,
    /// Custom price table; the built-in Anthropic prices apply when unset.
    pub pricing: Option<PricingTable>,
}

impl Config {
    pub fn waveplan_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".waveplan"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::waveplan_dir()?.join("waveplan.toml"))
    }

    /// Load `~/.waveplan/waveplan.toml`, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading config");
        if !path.exists() {
            tracing::debug!("config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        tracing::debug!(governor = ?config.governor, custom_pricing = config.pricing.is_some(), "config loaded");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.governor.validate()?;
        if let Some(pricing) = &self.pricing {
            pricing.validate()?;
        }
        Ok(())
    }

    /// The price table in effect.
    pub fn effective_pricing(&self) -> PricingTable {
        self.pricing.clone().unwrap_or_default()
    }
}
