//! Trust Policy
//!
//! Decay, floor and smoothing rules applied by the ledger.

use serde::{Deserialize, Serialize};
use trustroute_core::RoutingConfig;

/// Trust assigned to a link on first observation, and assumed for unknown links
pub const INITIAL_TRUST: f64 = 1.0;
/// Trust never decays below this value
pub const DEFAULT_TRUST_FLOOR: f64 = 0.3;
/// Factor applied to trust on every drop observed in proposed mode
pub const DEFAULT_TRUST_DECAY: f64 = 0.5;
/// Weight of the newest sample in the SNR moving average
pub const DEFAULT_EMA_ALPHA: f64 = 0.3;
/// Fraction of distrusted incident links above which a node is a blackhole
pub const BLACKHOLE_MAJORITY: f64 = 0.5;

/// Rules for updating link trust and signal quality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustPolicy {
    /// Lowest reachable trust value
    pub floor: f64,
    /// Multiplicative penalty per drop
    pub decay: f64,
    /// EMA smoothing factor for SNR samples
    pub ema_alpha: f64,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            floor: DEFAULT_TRUST_FLOOR,
            decay: DEFAULT_TRUST_DECAY,
            ema_alpha: DEFAULT_EMA_ALPHA,
        }
    }
}

impl From<&RoutingConfig> for TrustPolicy {
    fn from(config: &RoutingConfig) -> Self {
        Self {
            floor: config.trust_floor,
            decay: config.trust_decay,
            ema_alpha: config.ema_alpha,
        }
    }
}

impl TrustPolicy {
    /// Trust after one more observed drop
    pub fn penalize(&self, trust: f64) -> f64 {
        (trust * self.decay).max(self.floor)
    }

    /// Raise `trust` to the floor if it sits below it
    pub fn clamp(&self, trust: f64) -> f64 {
        trust.max(self.floor)
    }

    /// Fold `sample` into the moving average `average`
    pub fn smooth(&self, average: f64, sample: f64) -> f64 {
        self.ema_alpha * sample + (1.0 - self.ema_alpha) * average
    }

    /// Whether a link at `trust` has decayed all the way to the floor.
    ///
    /// Decay is clamped at the floor, so "below the floor" is unreachable;
    /// a link counts as distrusted once it reaches it.
    pub fn is_distrusted(&self, trust: f64) -> bool {
        trust <= self.floor + f64::EPSILON
    }
}
