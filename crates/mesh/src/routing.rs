//! Trust-aware routing graph
//!
//! Turns a topology snapshot plus trust ledger state into a weighted
//! undirected graph. The builder sees only ledger state: there is no input
//! through which known-malicious nodes could be filtered or penalised.

use crate::topology::TopologySnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trustroute_core::{LinkKey, NodeId, RoutingConfig, RoutingMode};
use trustroute_trust_mesh::TrustLedger;

/// Edge weighting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub mode: RoutingMode,
    /// Weight of the physical term `alpha / snr`
    pub alpha: f64,
    /// Weight of the behavioural term `beta / trust`
    pub beta: f64,
    /// Trust is raised to at least this value before division
    pub trust_floor: f64,
    /// SNR used for links without a positive observation
    pub default_snr: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::from(&RoutingConfig::default())
    }
}

impl From<&RoutingConfig> for CostModel {
    fn from(config: &RoutingConfig) -> Self {
        Self {
            mode: config.mode,
            alpha: config.alpha,
            beta: config.beta,
            trust_floor: config.trust_floor,
            default_snr: config.default_snr,
        }
    }
}

impl CostModel {
    /// Cost of a link with smoothed `snr` and behavioural `trust`.
    ///
    /// Baseline mode is pure hop count. Proposed mode is
    /// `alpha / snr + beta / trust` with trust clamped to the floor and
    /// non-positive SNR replaced by the default.
    pub fn cost(&self, snr: f64, trust: f64) -> f64 {
        match self.mode {
            RoutingMode::Baseline => 1.0,
            RoutingMode::Proposed => {
                let snr = if snr > 0.0 { snr } else { self.default_snr };
                let trust = trust.max(self.trust_floor);
                self.alpha / snr + self.beta / trust
            }
        }
    }

    /// Cost of the link `(a, b)` as currently recorded in `ledger`
    pub fn link_cost(&self, ledger: &TrustLedger, a: NodeId, b: NodeId) -> f64 {
        match self.mode {
            RoutingMode::Baseline => 1.0,
            RoutingMode::Proposed => self.cost(
                ledger.snr_of(a, b, self.default_snr),
                ledger.trust_of(a, b),
            ),
        }
    }
}

/// Half of an undirected edge as seen from one endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: NodeId,
    pub cost: f64,
}

/// Weighted undirected graph for one tick
#[derive(Debug, Clone, Default)]
pub struct RoutingGraph {
    adjacency: BTreeMap<NodeId, Vec<Edge>>,
    weights: BTreeMap<LinkKey, f64>,
}

impl RoutingGraph {
    /// Empty graph containing `nodes` with no edges
    pub fn with_nodes<I: IntoIterator<Item = NodeId>>(nodes: I) -> Self {
        Self {
            adjacency: nodes.into_iter().map(|n| (n, Vec::new())).collect(),
            weights: BTreeMap::new(),
        }
    }

    /// Insert or overwrite the undirected edge `(a, b)`
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, cost: f64) {
        let key = LinkKey::new(a, b);
        if self.weights.insert(key, cost).is_some() {
            for (from, to) in [(a, b), (b, a)] {
                if let Some(edge) = self
                    .adjacency
                    .get_mut(&from)
                    .and_then(|edges| edges.iter_mut().find(|e| e.to == to))
                {
                    edge.cost = cost;
                }
            }
            return;
        }
        self.adjacency.entry(a).or_default().push(Edge { to: b, cost });
        self.adjacency.entry(b).or_default().push(Edge { to: a, cost });
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.adjacency.contains_key(&node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Outgoing edges of `node`; empty for unknown nodes
    pub fn edges(&self, node: NodeId) -> &[Edge] {
        self.adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.weights.get(&LinkKey::new(a, b)).copied()
    }

    /// Every edge weight keyed by normalised link
    pub fn edge_weights(&self) -> &BTreeMap<LinkKey, f64> {
        &self.weights
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    /// Sum of edge weights along `path`, or `None` if a hop is not an edge
    pub fn path_cost(&self, path: &[NodeId]) -> Option<f64> {
        path.windows(2)
            .map(|hop| self.weight(hop[0], hop[1]))
            .sum()
    }
}

/// Rebuilds the routing graph from scratch every tick
#[derive(Debug, Clone, Default)]
pub struct RoutingGraphBuilder {
    cost_model: CostModel,
}

impl RoutingGraphBuilder {
    pub fn new(cost_model: CostModel) -> Self {
        Self { cost_model }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Build the graph for `snapshot` weighted by `ledger`.
    ///
    /// Total rebuild, O(n²) in node count.
    pub fn build(&self, snapshot: &TopologySnapshot, ledger: &TrustLedger) -> RoutingGraph {
        let mut graph = RoutingGraph::with_nodes(snapshot.nodes());
        for link in snapshot.links() {
            let cost = self.cost_model.link_cost(ledger, link.low(), link.high());
            tracing::trace!(link = %link, cost, "Edge weighted");
            graph.add_edge(link.low(), link.high(), cost);
        }
        tracing::debug!(
            mode = %self.cost_model.mode,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Routing graph rebuilt"
        );
        graph
    }
}
