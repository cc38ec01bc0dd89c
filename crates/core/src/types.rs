//! Core types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node in the wireless network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Raw numeric identifier
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Undirected link between two nodes.
///
/// The pair is normalised so that `low <= high`; `LinkKey::new(a, b)` and
/// `LinkKey::new(b, a)` are equal and hash identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    low: NodeId,
    high: NodeId,
}

impl LinkKey {
    /// Build the normalised key for the pair `(a, b)`
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Smaller endpoint
    pub fn low(&self) -> NodeId {
        self.low
    }

    /// Larger endpoint
    pub fn high(&self) -> NodeId {
        self.high
    }

    /// Whether `node` is one of the endpoints
    pub fn contains(&self, node: NodeId) -> bool {
        self.low == node || self.high == node
    }

    /// The endpoint opposite `node`, if `node` is on this link
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.low == node {
            Some(self.high)
        } else if self.high == node {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<->{}", self.low, self.high)
    }
}

/// Cartesian node position in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Edge weighting strategy used when building the routing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Pure hop count; drops never touch trust
    Baseline,
    /// Signal quality plus behavioural trust
    #[default]
    Proposed,
}

impl RoutingMode {
    /// Whether observed drops decay link trust in this mode
    pub fn trust_enabled(self) -> bool {
        matches!(self, RoutingMode::Proposed)
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMode::Baseline => write!(f, "baseline"),
            RoutingMode::Proposed => write!(f, "proposed"),
        }
    }
}

/// A registered (source, destination) pair whose route is maintained every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowEndpoint {
    pub source: NodeId,
    pub destination: NodeId,
}

impl FlowEndpoint {
    pub fn new(source: NodeId, destination: NodeId) -> Self {
        Self {
            source,
            destination,
        }
    }
}
