//! End-to-end control loop tests
//!
//! A relay silently drops everything it should forward. The host walks one
//! packet per tick along the installed tables and reports what it saw.

use crate::test_utils::*;
use std::thread;
use std::time::Duration;
use trustroute_core::{FlowEndpoint, RoutingMode};
use trustroute_mesh::{DeliveryEvent, DropLayer};

/// Relay 1 sits on the two-hop path 0-1-2; 0-3-4-2 is the three-hop detour
const HUB: [(u32, f64, f64); 5] = [
    (0, 0.0, 0.0),
    (1, 100.0, 0.0),
    (2, 200.0, 0.0),
    (3, 50.0, 100.0),
    (4, 150.0, 100.0),
];

const RANGE: f64 = 150.0;

fn flow() -> FlowEndpoint {
    FlowEndpoint::new(n(0), n(2))
}

#[test]
fn test_proposed_converges_away_from_dropping_relay() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Proposed, RANGE));
    control.register_flow(flow());

    let mut delivered = Vec::new();
    for i in 0..12 {
        control.tick(tick_at(i)).expect("loop is running");
        delivered.push(send_packet(&control, n(0), n(2), &[n(1)]));
    }

    assert_eq!(control.flows().active_path(&flow()), &[n(0), n(3), n(4), n(2)]);
    assert!(!delivered[0], "first packet goes through the relay");
    assert!(delivered[6..].iter().all(|ok| *ok), "late packets arrive");

    // The link into the relay decayed to the floor, not below
    assert!((control.ledger().trust_of(n(0), n(1)) - 0.3).abs() < 1e-12);
    assert_eq!(control.ledger().drop_count(n(0), n(1)), 2);
    // The relay's outbound link never carried a report
    assert_eq!(control.ledger().trust_of(n(1), n(2)), 1.0);

    let telemetry = control.telemetry().snapshot();
    assert_eq!(telemetry.network_drops, telemetry.malicious_drops);
    assert_eq!(telemetry.trust_penalties, telemetry.network_drops);
    assert!(telemetry.network_drops >= 2);
    assert_eq!(telemetry.heartbeats, 12);
}

#[test]
fn test_baseline_keeps_routing_through_dropping_relay() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Baseline, RANGE));
    control.register_flow(flow());

    for i in 0..12 {
        control.tick(tick_at(i)).expect("loop is running");
        assert!(!send_packet(&control, n(0), n(2), &[n(1)]));
    }

    assert_eq!(control.flows().active_path(&flow()), &[n(0), n(1), n(2)]);
    assert_eq!(control.ledger().trust_of(n(0), n(1)), 1.0);
    // Drops reported after the last tick are still queued
    assert_eq!(control.ledger().drop_count(n(0), n(1)), 11);
    assert_eq!(control.telemetry().snapshot().trust_penalties, 0);
    assert!(control.ledger().blackholes((0..5).map(n)).is_empty());
}

#[test]
fn test_install_retracts_before_each_hop() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Proposed, RANGE));
    control.register_flow(flow());
    control.tick(Duration::ZERO).expect("loop is running");

    assert_eq!(
        control.installer().calls,
        vec![
            InstallerCall::Retract {
                node: n(0),
                destination: n(2),
            },
            InstallerCall::Install {
                node: n(0),
                destination: n(2),
                next_hop: n(1),
            },
            InstallerCall::Retract {
                node: n(1),
                destination: n(2),
            },
            InstallerCall::Install {
                node: n(1),
                destination: n(2),
                next_hop: n(2),
            },
        ]
    );
    assert_eq!(control.installer().tables.next_hop(n(1), n(2)), Some(n(2)));
    assert_eq!(control.installer().tables.next_hop(n(2), n(2)), None);
}

#[test]
fn test_unattributed_drop_queued_before_first_tick_reaches_neighbours() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Proposed, RANGE));
    assert!(control
        .event_sender()
        .send(DeliveryEvent::failure(n(1), None, DropLayer::Network)));

    let report = control.tick(Duration::ZERO).expect("loop is running");

    assert_eq!(report.events_applied, 1);
    assert_eq!(control.ledger().len(), 4);
    for neighbour in [0, 2, 3, 4] {
        assert!((control.ledger().trust_of(n(1), n(neighbour)) - 0.5).abs() < 1e-12);
        assert_eq!(control.ledger().drop_count(n(1), n(neighbour)), 1);
    }
    // Penalised links are already weighted in the graph built this tick
    let graph = control.preview_graph(Duration::ZERO);
    assert!((graph.weight(n(0), n(1)).expect("edge in range") - 1000.05).abs() < 1e-9);
    assert_eq!(control.telemetry().snapshot().trust_penalties, 4);
}

#[test]
fn test_events_from_other_threads_apply_on_next_tick() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Proposed, RANGE));
    control.register_flow(flow());
    control.tick(Duration::ZERO).expect("loop is running");

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let sender = control.event_sender();
            thread::spawn(move || {
                sender.send(DeliveryEvent::failure(n(1), Some(n(0)), DropLayer::Network))
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().expect("producer thread panicked"));
    }

    // Nothing applied until the loop drains the queue
    assert_eq!(control.ledger().trust_of(n(0), n(1)), 1.0);

    let report = control.tick(tick_at(1)).expect("loop is running");
    assert_eq!(report.events_applied, 2);
    assert!((control.ledger().trust_of(n(0), n(1)) - 0.3).abs() < 1e-12);
}

#[test]
fn test_unattributed_drop_resolves_sender_from_active_path() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Proposed, RANGE));
    control.register_flow(flow());
    control.tick(Duration::ZERO).expect("loop is running");

    let charged = control.ingest(&DeliveryEvent::failure(n(1), None, DropLayer::Network));

    assert_eq!(charged, 1);
    assert!((control.ledger().trust_of(n(0), n(1)) - 0.5).abs() < 1e-12);
    for other in [2, 3, 4] {
        assert_eq!(control.ledger().trust_of(n(1), n(other)), 1.0);
    }
}

#[test]
fn test_unattributed_drop_off_path_charges_all_neighbours() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Proposed, RANGE));
    control.tick(Duration::ZERO).expect("loop is running");

    let charged = control.ingest(&DeliveryEvent::failure(n(1), None, DropLayer::Phy));

    assert_eq!(charged, 4);
    for neighbour in [0, 2, 3, 4] {
        assert!((control.ledger().trust_of(n(1), n(neighbour)) - 0.5).abs() < 1e-12);
    }
    assert_eq!(control.telemetry().snapshot().phy_drops, 1);
}

#[test]
fn test_heartbeat_schedule_and_stop() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Proposed, RANGE));
    control.register_flow(flow());

    let reports = control.advance_to(Duration::from_millis(250));
    let ticks: Vec<_> = reports.iter().map(|r| (r.tick, r.at)).collect();
    assert_eq!(
        ticks,
        vec![
            (1, Duration::ZERO),
            (2, Duration::from_millis(100)),
            (3, Duration::from_millis(200)),
        ]
    );
    assert!(reports.iter().all(|r| r.routed_flows == 1 && r.nodes == 5));

    control.stop();
    assert!(!control.is_running());
    assert!(control.advance_to(Duration::from_secs(10)).is_empty());
    assert!(control.tick(Duration::from_secs(10)).is_none());
    assert_eq!(control.heartbeat().ticks(), 3);
}

#[test]
fn test_tick_report_serializes() {
    let mut control = control_loop(&HUB, &config(RoutingMode::Proposed, RANGE));
    control.register_flow(flow());
    let report = control.tick(Duration::ZERO).expect("loop is running");

    let json = serde_json::to_value(&report).expect("report serializes");
    assert_eq!(json["tick"], 1);
    assert_eq!(json["routed_flows"], 1);
    assert_eq!(json["edges"], report.edges);
    assert!(json["blackholes"].as_array().is_some_and(|b| b.is_empty()));
}
