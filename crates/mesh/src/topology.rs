//! Topology discovery
//!
//! The host environment reports node positions through [`TopologyProvider`];
//! each control-loop tick turns them into an ephemeral [`TopologySnapshot`].

use std::collections::BTreeMap;
use std::time::Duration;
use trustroute_core::{LinkKey, NodeId, Position};

/// Node positions keyed by identifier
pub type Positions = BTreeMap<NodeId, Position>;

/// Port through which the host supplies current node positions
pub trait TopologyProvider {
    /// Positions of every node at simulated time `now`
    fn positions(&mut self, now: Duration) -> Positions;
}

/// A fixed set of positions, for hosts without mobility
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    positions: Positions,
}

impl StaticTopology {
    pub fn new(positions: Positions) -> Self {
        Self { positions }
    }

    /// Move or add a node
    pub fn place(&mut self, node: NodeId, position: Position) {
        self.positions.insert(node, position);
    }
}

impl FromIterator<(NodeId, Position)> for StaticTopology {
    fn from_iter<I: IntoIterator<Item = (NodeId, Position)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl TopologyProvider for StaticTopology {
    fn positions(&mut self, _now: Duration) -> Positions {
        self.positions.clone()
    }
}

/// Connectivity at one instant: an edge exists iff two nodes are strictly
/// closer than `max_range`.
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    positions: Positions,
    max_range: f64,
}

impl TopologySnapshot {
    pub fn new(positions: Positions, max_range: f64) -> Self {
        Self {
            positions,
            max_range,
        }
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    pub fn position(&self, node: NodeId) -> Option<&Position> {
        self.positions.get(&node)
    }

    /// All known nodes in identifier order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.positions.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Distance between two known nodes
    pub fn distance(&self, a: NodeId, b: NodeId) -> Option<f64> {
        let pa = self.positions.get(&a)?;
        let pb = self.positions.get(&b)?;
        Some(pa.distance_to(pb))
    }

    /// Whether `a` and `b` are distinct known nodes within radio range
    pub fn in_range(&self, a: NodeId, b: NodeId) -> bool {
        a != b
            && self
                .distance(a, b)
                .is_some_and(|distance| distance < self.max_range)
    }

    /// Nodes within range of `node`
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let Some(origin) = self.positions.get(&node) else {
            return Vec::new();
        };
        self.positions
            .iter()
            .filter(|(id, pos)| **id != node && origin.distance_to(pos) < self.max_range)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Every in-range unordered pair. O(n²) in node count.
    pub fn links(&self) -> Vec<LinkKey> {
        let nodes: Vec<(&NodeId, &Position)> = self.positions.iter().collect();
        let mut links = Vec::new();
        for (i, (a, pa)) in nodes.iter().enumerate() {
            for (b, pb) in nodes.iter().skip(i + 1) {
                if pa.distance_to(pb) < self.max_range {
                    links.push(LinkKey::new(**a, **b));
                }
            }
        }
        links
    }
}
