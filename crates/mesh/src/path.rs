//! Shortest path computation
//!
//! Single-source Dijkstra over a [`RoutingGraph`], run once per flow per tick.
//! Among equal-cost alternatives the chosen path is whichever the frontier
//! happens to settle first; only the total cost is guaranteed.

use crate::routing::RoutingGraph;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use trustroute_core::NodeId;

/// Frontier entry ordered so the heap pops the smallest distance first
#[derive(Debug, Clone, Copy)]
struct Frontier {
    distance: f64,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// A computed route and its total cost
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Source to destination inclusive
    pub hops: Vec<NodeId>,
    pub cost: f64,
}

/// Dijkstra solver
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestPathSolver;

impl ShortestPathSolver {
    pub fn new() -> Self {
        Self
    }

    /// Node sequence from `source` to `destination`, or empty if disconnected
    pub fn shortest_path(
        &self,
        graph: &RoutingGraph,
        source: NodeId,
        destination: NodeId,
    ) -> Vec<NodeId> {
        self.solve(graph, source, destination)
            .map(|route| route.hops)
            .unwrap_or_default()
    }

    /// Route from `source` to `destination` with its cost, if one exists.
    ///
    /// Terminates as soon as the destination is settled. Unknown endpoints
    /// and disconnected pairs yield `None`, never an error.
    pub fn solve(
        &self,
        graph: &RoutingGraph,
        source: NodeId,
        destination: NodeId,
    ) -> Option<Route> {
        if !graph.contains(source) || !graph.contains(destination) {
            return None;
        }

        let mut distance: HashMap<NodeId, f64> = HashMap::new();
        let mut predecessor: HashMap<NodeId, NodeId> = HashMap::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut frontier = BinaryHeap::new();

        distance.insert(source, 0.0);
        frontier.push(Frontier {
            distance: 0.0,
            node: source,
        });

        while let Some(Frontier { distance: d, node }) = frontier.pop() {
            if !visited.insert(node) {
                continue;
            }
            if node == destination {
                return Some(Route {
                    hops: unwind(&predecessor, source, destination),
                    cost: d,
                });
            }

            for edge in graph.edges(node) {
                if visited.contains(&edge.to) {
                    continue;
                }
                let candidate = d + edge.cost;
                let better = distance
                    .get(&edge.to)
                    .map_or(true, |current| candidate < *current);
                if better {
                    distance.insert(edge.to, candidate);
                    predecessor.insert(edge.to, node);
                    frontier.push(Frontier {
                        distance: candidate,
                        node: edge.to,
                    });
                }
            }
        }

        None
    }
}

fn unwind(predecessor: &HashMap<NodeId, NodeId>, source: NodeId, destination: NodeId) -> Vec<NodeId> {
    let mut hops = vec![destination];
    let mut current = destination;
    while current != source {
        match predecessor.get(&current) {
            Some(prev) => {
                current = *prev;
                hops.push(current);
            }
            None => return Vec::new(),
        }
    }
    hops.reverse();
    hops
}
