//! Trust Ledger
//!
//! In-memory store of per-link behavioural metrics. Links are created lazily
//! on first observation and live for the lifetime of the process.

use crate::trust::{TrustPolicy, INITIAL_TRUST};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trustroute_core::{LinkKey, NodeId};

/// Observed behaviour of one undirected link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkMetric {
    /// Exponential moving average of positive SNR samples
    pub moving_avg_snr: f64,
    /// Cumulative observed failures
    pub drop_count: u64,
    /// Behavioural trust in `[floor, 1.0]`
    pub trust: f64,
}

impl Default for LinkMetric {
    fn default() -> Self {
        Self {
            moving_avg_snr: 0.0,
            drop_count: 0,
            trust: INITIAL_TRUST,
        }
    }
}

/// Per-link trust ledger.
///
/// The ledger is the only state carried across control-loop ticks. It cannot
/// fail: lookups of unknown links degrade to optimistic defaults.
#[derive(Debug, Clone, Default)]
pub struct TrustLedger {
    policy: TrustPolicy,
    links: BTreeMap<LinkKey, LinkMetric>,
}

impl TrustLedger {
    /// Create an empty ledger with the default policy
    pub fn new() -> Self {
        Self::with_policy(TrustPolicy::default())
    }

    /// Create an empty ledger with a custom policy
    pub fn with_policy(policy: TrustPolicy) -> Self {
        Self {
            policy,
            links: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Record one delivery outcome on the link `(a, b)`.
    ///
    /// A positive `snr_sample` is folded into the moving average. A drop
    /// always bumps `drop_count`; trust only decays when `trust_enabled`
    /// is set, which is how baseline mode ignores trust entirely.
    pub fn observe(
        &mut self,
        a: NodeId,
        b: NodeId,
        snr_sample: f64,
        dropped: bool,
        trust_enabled: bool,
    ) {
        let key = LinkKey::new(a, b);
        let policy = self.policy;
        let metric = self.links.entry(key).or_default();

        if snr_sample > 0.0 {
            metric.moving_avg_snr = policy.smooth(metric.moving_avg_snr, snr_sample);
        }

        if dropped {
            metric.drop_count += 1;
            if trust_enabled {
                let before = metric.trust;
                metric.trust = policy.penalize(before);
                tracing::debug!(
                    link = %key,
                    drops = metric.drop_count,
                    trust_before = before,
                    trust_after = metric.trust,
                    "Trust penalty applied"
                );
            }
        }
    }

    /// Trust of `(a, b)`, never below the floor. Unknown links are fully trusted.
    pub fn trust_of(&self, a: NodeId, b: NodeId) -> f64 {
        let trust = self
            .links
            .get(&LinkKey::new(a, b))
            .map(|m| m.trust)
            .unwrap_or(INITIAL_TRUST);
        self.policy.clamp(trust)
    }

    /// Smoothed SNR of `(a, b)`, or `default_snr` when unobserved or non-positive
    pub fn snr_of(&self, a: NodeId, b: NodeId, default_snr: f64) -> f64 {
        match self.links.get(&LinkKey::new(a, b)) {
            Some(metric) if metric.moving_avg_snr > 0.0 => metric.moving_avg_snr,
            _ => default_snr,
        }
    }

    /// Cumulative drops on `(a, b)`
    pub fn drop_count(&self, a: NodeId, b: NodeId) -> u64 {
        self.links
            .get(&LinkKey::new(a, b))
            .map(|m| m.drop_count)
            .unwrap_or(0)
    }

    /// Stored metric for `(a, b)`, if the link has been observed
    pub fn metric(&self, a: NodeId, b: NodeId) -> Option<&LinkMetric> {
        self.links.get(&LinkKey::new(a, b))
    }

    /// All observed links in key order
    pub fn links(&self) -> impl Iterator<Item = (&LinkKey, &LinkMetric)> {
        self.links.iter()
    }

    /// Observed links incident to `node`
    pub fn incident_links(&self, node: NodeId) -> impl Iterator<Item = (&LinkKey, &LinkMetric)> {
        self.links.iter().filter(move |(key, _)| key.contains(node))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
