//! Configuration management for TrustRoute.
//!
//! Every field carries a default so a partial TOML document (or none at all)
//! yields a usable configuration.

use crate::error::{ConfigError, CoreResult};
use crate::types::RoutingMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for the trust ledger, cost function and control loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Weight of the signal-quality term `alpha / snr`
    pub alpha: f64,
    /// Weight of the trust term `beta / trust`
    pub beta: f64,
    /// Lowest value link trust may decay to
    pub trust_floor: f64,
    /// Multiplicative trust penalty applied per observed drop
    pub trust_decay: f64,
    /// Smoothing factor of the SNR moving average
    pub ema_alpha: f64,
    /// Radio range in metres; nodes strictly closer than this share an edge
    pub max_range: f64,
    /// SNR assumed for links without a positive observation
    pub default_snr: f64,
    /// Edge weighting strategy
    pub mode: RoutingMode,
    /// Control loop period in milliseconds of simulated time
    pub heartbeat_period_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 500.0,
            trust_floor: 0.3,
            trust_decay: 0.5,
            ema_alpha: 0.3,
            max_range: 250.0,
            default_snr: 20.0,
            mode: RoutingMode::Proposed,
            heartbeat_period_ms: 100,
        }
    }
}

impl RoutingConfig {
    /// Default configuration running in `mode`
    pub fn with_mode(mode: RoutingMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Load and validate a configuration file
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), mode = %config.mode, "Loaded routing config");
        Ok(config)
    }

    /// Parse and validate a TOML document
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Heartbeat period as a [`Duration`]
    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(self.heartbeat_period_ms)
    }

    /// Check every field against its permitted range
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &str) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            }
        }

        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(invalid("alpha", "must be a finite non-negative number"));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(invalid("beta", "must be a finite non-negative number"));
        }
        if !(self.trust_floor > 0.0 && self.trust_floor <= 1.0) {
            return Err(invalid("trust_floor", "must lie in (0, 1]"));
        }
        if !(self.trust_decay > 0.0 && self.trust_decay < 1.0) {
            return Err(invalid("trust_decay", "must lie in (0, 1)"));
        }
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(invalid("ema_alpha", "must lie in (0, 1]"));
        }
        if !self.max_range.is_finite() || self.max_range <= 0.0 {
            return Err(invalid("max_range", "must be a finite positive distance"));
        }
        if !self.default_snr.is_finite() || self.default_snr <= 0.0 {
            return Err(invalid("default_snr", "must be a finite positive number"));
        }
        if self.heartbeat_period_ms == 0 {
            return Err(invalid("heartbeat_period_ms", "must be greater than zero"));
        }
        Ok(())
    }
}
