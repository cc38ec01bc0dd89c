//! Route installation
//!
//! The control loop drives forwarding-table changes through the
//! [`RouteInstaller`] port. [`ForwardingTables`] is the in-memory
//! implementation used by synthetic hosts and tests.

use crate::error::MeshResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use trustroute_core::NodeId;

/// Forwarding-table mutation interface exposed by the host.
///
/// Both operations must be idempotent.
pub trait RouteInstaller {
    /// Make `node` forward traffic for `destination` to `next_hop`
    fn install(&mut self, node: NodeId, destination: NodeId, next_hop: NodeId) -> MeshResult<()>;

    /// Remove any route on `node` for `destination`
    fn retract(&mut self, node: NodeId, destination: NodeId) -> MeshResult<()>;
}

/// Route entry in a node's forwarding table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Destination node ID
    pub destination: NodeId,
    /// Next hop node ID
    pub next_hop: NodeId,
    /// Simulated time of installation
    pub installed_at: Duration,
}

/// Per-node forwarding tables held in memory
#[derive(Debug, Clone, Default)]
pub struct ForwardingTables {
    /// node -> destination -> entry
    tables: BTreeMap<NodeId, BTreeMap<NodeId, RouteEntry>>,
    /// Stamp applied to newly installed routes
    clock: Duration,
    installs: u64,
    retracts: u64,
}

impl ForwardingTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time recorded on subsequent installs
    pub fn set_clock(&mut self, now: Duration) {
        self.clock = now;
    }

    /// Find the next hop for a destination
    pub fn next_hop(&self, node: NodeId, destination: NodeId) -> Option<NodeId> {
        self.route(node, destination).map(|entry| entry.next_hop)
    }

    pub fn route(&self, node: NodeId, destination: NodeId) -> Option<&RouteEntry> {
        self.tables.get(&node)?.get(&destination)
    }

    /// All routes held by `node`
    pub fn routes(&self, node: NodeId) -> Vec<&RouteEntry> {
        self.tables
            .get(&node)
            .map(|table| table.values().collect())
            .unwrap_or_default()
    }

    /// Total routes across all nodes
    pub fn route_count(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    /// Install calls received
    pub fn installs(&self) -> u64 {
        self.installs
    }

    /// Retract calls received
    pub fn retracts(&self) -> u64 {
        self.retracts
    }
}

impl RouteInstaller for ForwardingTables {
    fn install(&mut self, node: NodeId, destination: NodeId, next_hop: NodeId) -> MeshResult<()> {
        self.installs += 1;
        self.tables.entry(node).or_default().insert(
            destination,
            RouteEntry {
                destination,
                next_hop,
                installed_at: self.clock,
            },
        );
        Ok(())
    }

    fn retract(&mut self, node: NodeId, destination: NodeId) -> MeshResult<()> {
        self.retracts += 1;
        if let Some(table) = self.tables.get_mut(&node) {
            table.remove(&destination);
            if table.is_empty() {
                self.tables.remove(&node);
            }
        }
        Ok(())
    }
}
