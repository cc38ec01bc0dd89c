//! Blackhole Classification
//!
//! Derived, never-stored verdict on whether a node drops traffic on most of
//! its links. Computed on demand from ledger state for telemetry; the routing
//! cost function must not consume it.

use crate::ledger::TrustLedger;
use crate::trust::BLACKHOLE_MAJORITY;
use serde::{Deserialize, Serialize};
use trustroute_core::NodeId;

/// Classification of one node from the trust of its incident links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeClassification {
    pub node: NodeId,
    /// Observed links touching the node
    pub incident_links: usize,
    /// Incident links whose trust has decayed to the floor
    pub distrusted_links: usize,
    /// More than half of the incident links are distrusted
    pub is_blackhole: bool,
}

impl TrustLedger {
    /// Scan every observed link touching `node` and classify it.
    ///
    /// O(number of known links); recomputed on each call.
    pub fn classify(&self, node: NodeId) -> NodeClassification {
        let policy = *self.policy();
        let (incident_links, distrusted_links) =
            self.incident_links(node)
                .fold((0usize, 0usize), |(total, bad), (_, metric)| {
                    let bad = bad + usize::from(policy.is_distrusted(metric.trust));
                    (total + 1, bad)
                });

        let is_blackhole = incident_links > 0
            && (distrusted_links as f64 / incident_links as f64) > BLACKHOLE_MAJORITY;

        NodeClassification {
            node,
            incident_links,
            distrusted_links,
            is_blackhole,
        }
    }

    /// Whether `node` is currently classified as a blackhole
    pub fn is_blackhole(&self, node: NodeId) -> bool {
        self.classify(node).is_blackhole
    }

    /// Every node in `nodes` classified as a blackhole, in input order
    pub fn blackholes<I>(&self, nodes: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        nodes
            .into_iter()
            .filter(|node| self.is_blackhole(*node))
            .collect()
    }
}
