//! Graph-level routing scenarios
//!
//! Each test builds a ledger from observed drops, weights a snapshot in both
//! modes and checks the route Dijkstra picks.

use crate::test_utils::*;
use std::time::Duration;
use trustroute_core::{FlowEndpoint, RoutingConfig, RoutingMode};
use trustroute_mesh::{
    CostModel, RoutingGraph, RoutingGraphBuilder, ShortestPathSolver, TopologySnapshot,
};
use trustroute_trust_mesh::TrustLedger;

/// Line 0-1-2 with a longer detour 1-3-4-2, range 150
const DETOUR: [(u32, f64, f64); 5] = [
    (0, 0.0, 0.0),
    (1, 100.0, 0.0),
    (2, 200.0, 0.0),
    (3, 100.0, 120.0),
    (4, 200.0, 120.0),
];

/// Every pair in range except 0-2; relays 1 and 3 sit between them.
///
/// The 0-2 edge is left out so the flow 0 -> 2 needs a relay at all; with it
/// the graph would be complete and no path would ever cross a relay.
const DIAMOND: [(u32, f64, f64); 4] = [
    (0, 0.0, 0.0),
    (1, 100.0, 60.0),
    (2, 200.0, 0.0),
    (3, 100.0, -60.0),
];

fn build(mode: RoutingMode, snapshot: &TopologySnapshot, ledger: &TrustLedger) -> RoutingGraph {
    let config = config(mode, snapshot.max_range());
    RoutingGraphBuilder::new(CostModel::from(&config)).build(snapshot, ledger)
}

fn drop_on(ledger: &mut TrustLedger, a: u32, b: u32, times: usize) {
    for _ in 0..times {
        ledger.observe(n(a), n(b), 0.0, true, true);
    }
}

#[test]
fn test_proposed_routes_around_low_trust_link() {
    let snapshot = snapshot(&DETOUR, 150.0);
    let mut ledger = TrustLedger::new();
    drop_on(&mut ledger, 1, 2, 2);
    assert!((ledger.trust_of(n(1), n(2)) - 0.3).abs() < 1e-12);

    let graph = build(RoutingMode::Proposed, &snapshot, &ledger);
    let route = ShortestPathSolver::new()
        .solve(&graph, n(0), n(2))
        .expect("detour exists");

    assert_eq!(route.hops, vec![n(0), n(1), n(3), n(4), n(2)]);
    assert!((route.cost - 2000.2).abs() < 1e-6);

    let direct = graph
        .path_cost(&[n(0), n(1), n(2)])
        .expect("direct path is in the graph");
    assert!(direct > route.cost);
    assert!((direct - 2166.7667).abs() < 1e-3);
}

#[test]
fn test_baseline_keeps_fewest_hops_despite_drops() {
    let snapshot = snapshot(&DETOUR, 150.0);
    let mut ledger = TrustLedger::new();
    // Baseline hosts still report drops; they never touch trust
    for _ in 0..2 {
        ledger.observe(n(1), n(2), 0.0, true, false);
    }
    assert_eq!(ledger.trust_of(n(1), n(2)), 1.0);
    assert_eq!(ledger.drop_count(n(1), n(2)), 2);

    let graph = build(RoutingMode::Baseline, &snapshot, &ledger);
    let path = ShortestPathSolver::new().shortest_path(&graph, n(0), n(2));

    assert_eq!(path, vec![n(0), n(1), n(2)]);
    assert_eq!(graph.path_cost(&path), Some(2.0));
}

#[test]
fn test_baseline_ignores_decayed_trust_in_shared_ledger() {
    let snapshot = snapshot(&DETOUR, 150.0);
    let mut ledger = TrustLedger::new();
    drop_on(&mut ledger, 1, 2, 5);

    let graph = build(RoutingMode::Baseline, &snapshot, &ledger);
    assert!(graph.edge_weights().values().all(|w| *w == 1.0));
    assert_eq!(
        ShortestPathSolver::new().shortest_path(&graph, n(0), n(2)),
        vec![n(0), n(1), n(2)]
    );
}

fn blackhole_ledger() -> TrustLedger {
    let mut ledger = TrustLedger::new();
    for neighbour in [0, 1, 2] {
        drop_on(&mut ledger, 3, neighbour, 3);
    }
    // Honest relay links carry traffic too
    for (a, b) in [(0, 1), (1, 2)] {
        ledger.observe(n(a), n(b), 22.0, false, true);
    }
    ledger
}

#[test]
fn test_blackhole_classified_from_drops_alone() {
    let ledger = blackhole_ledger();

    assert!(ledger.is_blackhole(n(3)));
    let classification = ledger.classify(n(3));
    assert_eq!(classification.incident_links, 3);
    assert_eq!(classification.distrusted_links, 3);

    for honest in [0, 1, 2] {
        assert!(!ledger.is_blackhole(n(honest)), "n{honest} misclassified");
    }
    assert_eq!(ledger.blackholes((0..4).map(n)), vec![n(3)]);
}

#[test]
fn test_proposed_avoids_classified_blackhole() {
    let snapshot = snapshot(&DIAMOND, 150.0);
    let ledger = blackhole_ledger();

    let graph = build(RoutingMode::Proposed, &snapshot, &ledger);
    let path = ShortestPathSolver::new().shortest_path(&graph, n(0), n(2));

    assert_eq!(path, vec![n(0), n(1), n(2)]);
    assert!(!path.contains(&n(3)));
}

#[test]
fn test_baseline_treats_blackhole_as_any_relay() {
    let snapshot = snapshot(&DIAMOND, 150.0);
    let ledger = blackhole_ledger();

    let graph = build(RoutingMode::Baseline, &snapshot, &ledger);
    let route = ShortestPathSolver::new()
        .solve(&graph, n(0), n(2))
        .expect("graph is connected");

    // Both relays are two hops; the path through the blackhole is just as short
    assert_eq!(route.cost, 2.0);
    assert_eq!(graph.path_cost(&[n(0), n(3), n(2)]), Some(route.cost));
    assert_eq!(graph.weight(n(0), n(3)), Some(1.0));
}

/// Blackhole 3 sits on the only two-hop path 0-3-2; 0-1-4-2 avoids it.
///
/// Four nodes cannot give the blackhole a unique fewest-hop path and still
/// leave an alternative around it, so one more honest relay is added.
const BYPASS: [(u32, f64, f64); 5] = [
    (0, 0.0, 0.0),
    (1, 50.0, 100.0),
    (2, 200.0, 0.0),
    (3, 100.0, 0.0),
    (4, 150.0, 100.0),
];

#[test]
fn test_baseline_traverses_blackhole_on_fewest_hop_path() {
    let snapshot = snapshot(&BYPASS, 150.0);
    let mut ledger = TrustLedger::new();
    for neighbour in [0, 1, 2, 4] {
        drop_on(&mut ledger, 3, neighbour, 3);
    }
    for (a, b) in [(0, 1), (1, 4), (4, 2)] {
        ledger.observe(n(a), n(b), 22.0, false, true);
    }
    assert!(ledger.is_blackhole(n(3)));
    assert_eq!(ledger.blackholes((0..5).map(n)), vec![n(3)]);

    let solver = ShortestPathSolver::new();
    let baseline = solver.shortest_path(&build(RoutingMode::Baseline, &snapshot, &ledger), n(0), n(2));
    let proposed = solver.shortest_path(&build(RoutingMode::Proposed, &snapshot, &ledger), n(0), n(2));

    assert_eq!(baseline, vec![n(0), n(3), n(2)]);
    assert_eq!(proposed, vec![n(0), n(1), n(4), n(2)]);
    assert!(!proposed.contains(&n(3)));
}

#[test]
fn test_blackhole_still_used_when_it_is_the_only_relay() {
    let without_relay: Vec<_> = DIAMOND.iter().copied().filter(|(id, ..)| *id != 1).collect();
    let snapshot = snapshot(&without_relay, 150.0);
    let ledger = blackhole_ledger();

    let graph = build(RoutingMode::Proposed, &snapshot, &ledger);
    let route = ShortestPathSolver::new()
        .solve(&graph, n(0), n(2))
        .expect("trust floor keeps the link usable");

    assert_eq!(route.hops, vec![n(0), n(3), n(2)]);
    assert!(route.cost.is_finite());
}

#[test]
fn test_unreachable_destination_installs_nothing() {
    let points = [(0, 0.0, 0.0), (1, 100.0, 0.0), (2, 1000.0, 0.0)];
    let mut control = control_loop(&points, &config(RoutingMode::Proposed, 150.0));
    control.register_flow(FlowEndpoint::new(n(0), n(2)));

    let report = control.tick(Duration::ZERO).expect("loop is running");

    assert_eq!(report.routed_flows, 0);
    assert_eq!(report.skipped_flows, 1);
    assert!(control.installer().calls.is_empty());
    assert!(control.flows().active_path(&FlowEndpoint::new(n(0), n(2))).is_empty());
    assert_eq!(control.telemetry().snapshot().route_install_skips, 1);
}

#[test]
fn test_unknown_flow_endpoint_yields_empty_path() {
    let snapshot = snapshot(&DETOUR, 150.0);
    let graph = build(RoutingMode::Proposed, &snapshot, &TrustLedger::new());

    assert!(ShortestPathSolver::new()
        .shortest_path(&graph, n(0), n(99))
        .is_empty());
}

#[test]
fn test_rebuild_is_deterministic() {
    let snapshot = snapshot(&DETOUR, 150.0);
    let mut ledger = TrustLedger::new();
    drop_on(&mut ledger, 1, 2, 1);
    ledger.observe(n(3), n(4), 17.5, false, true);

    let first = build(RoutingMode::Proposed, &snapshot, &ledger);
    let second = build(RoutingMode::Proposed, &snapshot, &ledger);

    assert_eq!(first.edge_weights(), second.edge_weights());
    assert_eq!(
        ShortestPathSolver::new().shortest_path(&first, n(0), n(2)),
        ShortestPathSolver::new().shortest_path(&second, n(0), n(2)),
    );
}

#[test]
fn test_config_drives_cost_model() {
    let config = RoutingConfig {
        beta: 100.0,
        ..config(RoutingMode::Proposed, 150.0)
    };
    let model = CostModel::from(&config);

    assert!((model.cost(20.0, 1.0) - 100.05).abs() < 1e-9);
    // Trust below the floor is clamped before dividing
    assert!((model.cost(20.0, 0.0) - (0.05 + 100.0 / 0.3)).abs() < 1e-9);
}
