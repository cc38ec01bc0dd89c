//! Control loop (heartbeat)
//!
//! Each tick runs three steps in order: rebuild the graph from the current
//! topology and ledger, compute a path for every registered flow, then push
//! the paths to the route installer. The ledger is the only state carried
//! between ticks; events queued before a tick are applied before its rebuild.

use crate::error::MeshResult;
use crate::forwarding::RouteInstaller;
use crate::ingestion::{
    event_queue, DeliveryEvent, EventIngestionAdapter, EventQueue, EventSender, EventSource,
    FlowRegistry,
};
use crate::path::ShortestPathSolver;
use crate::routing::{CostModel, RoutingGraph, RoutingGraphBuilder};
use crate::telemetry::MeshTelemetry;
use crate::topology::{TopologyProvider, TopologySnapshot};
use serde::Serialize;
use std::time::Duration;
use trustroute_core::{FlowEndpoint, NodeId, RoutingConfig};
use trustroute_trust_mesh::{TrustLedger, TrustPolicy};

/// Fixed-period schedule with cancellation
#[derive(Debug, Clone)]
pub struct Heartbeat {
    period: Duration,
    next_due: Duration,
    ticks: u64,
    running: bool,
}

impl Heartbeat {
    /// First tick is due at time zero
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: Duration::ZERO,
            ticks: 0,
            running: true,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_due(&self, now: Duration) -> bool {
        self.running && now >= self.next_due
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Count a tick at `now` and schedule the next one a period later
    fn fire(&mut self, now: Duration) -> u64 {
        self.ticks += 1;
        self.next_due = now + self.period;
        self.ticks
    }
}

/// Summary of one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub at: Duration,
    pub events_applied: usize,
    pub nodes: usize,
    pub edges: usize,
    pub routed_flows: usize,
    pub skipped_flows: usize,
    /// Nodes classified as blackholes after this tick's rebuild (telemetry only)
    pub blackholes: Vec<NodeId>,
}

/// Periodic orchestrator tying the ledger, graph builder and solver together
pub struct ControlLoop<T, R> {
    topology: T,
    installer: R,
    ledger: TrustLedger,
    builder: RoutingGraphBuilder,
    solver: ShortestPathSolver,
    adapter: EventIngestionAdapter,
    flows: FlowRegistry,
    telemetry: MeshTelemetry,
    heartbeat: Heartbeat,
    max_range: f64,
    snapshot: TopologySnapshot,
    events: EventQueue,
    sender: EventSender,
}

impl<T: TopologyProvider, R: RouteInstaller> ControlLoop<T, R> {
    /// Create a loop from a validated config
    pub fn new(
        config: &RoutingConfig,
        topology: T,
        installer: R,
        telemetry: MeshTelemetry,
    ) -> MeshResult<Self> {
        config.validate()?;
        let (sender, events) = event_queue();
        tracing::info!(
            mode = %config.mode,
            period_ms = config.heartbeat_period_ms,
            max_range = config.max_range,
            "Control loop created"
        );
        Ok(Self {
            topology,
            installer,
            ledger: TrustLedger::with_policy(TrustPolicy::from(config)),
            builder: RoutingGraphBuilder::new(CostModel::from(config)),
            solver: ShortestPathSolver::new(),
            adapter: EventIngestionAdapter::new(config.mode, telemetry.clone()),
            flows: FlowRegistry::new(),
            telemetry,
            heartbeat: Heartbeat::new(config.heartbeat_period()),
            max_range: config.max_range,
            snapshot: TopologySnapshot::new(Default::default(), config.max_range),
            events,
            sender,
        })
    }

    /// Register a flow to be routed every tick
    pub fn register_flow(&mut self, flow: FlowEndpoint) -> bool {
        let added = self.flows.register(flow);
        if added {
            tracing::info!(source = %flow.source, destination = %flow.destination, "Flow registered");
        }
        added
    }

    /// Producer handle for hosts delivering events from other threads
    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Apply one event immediately against the latest snapshot
    pub fn ingest(&mut self, event: &DeliveryEvent) -> usize {
        self.adapter
            .ingest(&mut self.ledger, &self.snapshot, &self.flows, event)
    }

    /// Drain a host-specific event source and apply its events immediately
    /// against the latest snapshot; returns the number of events applied
    pub fn ingest_from<S: EventSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let events = source.drain_events();
        self.apply_events(&events)
    }

    /// Run every tick due at or before `now`; returns their reports
    pub fn advance_to(&mut self, now: Duration) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while self.heartbeat.is_due(now) {
            let at = self.heartbeat.next_due();
            reports.push(self.run_tick(at));
        }
        reports
    }

    /// Run exactly one tick at `now`, regardless of schedule.
    ///
    /// Returns `None` once the loop has been stopped.
    pub fn tick(&mut self, now: Duration) -> Option<TickReport> {
        if !self.heartbeat.is_running() {
            return None;
        }
        Some(self.run_tick(now))
    }

    /// Cancel the loop; later ticks are no-ops
    pub fn stop(&mut self) {
        tracing::info!(ticks = self.heartbeat.ticks(), "Control loop stopped");
        self.heartbeat.stop();
    }

    pub fn is_running(&self) -> bool {
        self.heartbeat.is_running()
    }

    fn run_tick(&mut self, now: Duration) -> TickReport {
        let tick = self.heartbeat.fire(now);
        self.telemetry.record_heartbeat();

        // Topology discovery; queued events are attributed against it
        let positions = self.topology.positions(now);
        self.snapshot = TopologySnapshot::new(positions, self.max_range);

        let events = self.events.drain_events();
        let events_applied = self.apply_events(&events);
        let graph = self.builder.build(&self.snapshot, &self.ledger);

        // Path computation
        let paths: Vec<Vec<NodeId>> = self
            .flows
            .flows()
            .iter()
            .map(|flow| self.solver.shortest_path(&graph, flow.source, flow.destination))
            .collect();

        // Route installation
        let mut routed_flows = 0;
        let mut skipped_flows = 0;
        for (index, path) in paths.into_iter().enumerate() {
            let flow = self.flows.flows()[index];
            if path.is_empty() {
                tracing::debug!(
                    source = %flow.source,
                    destination = %flow.destination,
                    "No path this tick"
                );
                self.telemetry.record_install_skip();
                skipped_flows += 1;
            } else {
                self.install_path(flow.destination, &path);
                routed_flows += 1;
            }
            self.flows.set_active_path(index, path);
        }

        let blackholes = self.ledger.blackholes(self.snapshot.nodes());
        if !blackholes.is_empty() {
            tracing::debug!(?blackholes, "Nodes classified as blackholes");
        }

        let report = TickReport {
            tick,
            at: now,
            events_applied,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            routed_flows,
            skipped_flows,
            blackholes,
        };
        tracing::debug!(
            tick,
            at_ms = now.as_millis() as u64,
            events = events_applied,
            edges = report.edges,
            routed = routed_flows,
            skipped = skipped_flows,
            "Heartbeat complete"
        );
        report
    }

    fn apply_events(&mut self, events: &[DeliveryEvent]) -> usize {
        for event in events {
            self.adapter
                .ingest(&mut self.ledger, &self.snapshot, &self.flows, event);
        }
        events.len()
    }

    /// Retract then install on every node of `path` except the destination.
    ///
    /// Malicious nodes get routes like anyone else; letting them drop is how
    /// their links lose trust.
    fn install_path(&mut self, destination: NodeId, path: &[NodeId]) {
        for hop in path.windows(2) {
            let (node, next_hop) = (hop[0], hop[1]);
            match self.installer.retract(node, destination) {
                Ok(()) => self.telemetry.record_route_retracted(),
                Err(err) => {
                    tracing::warn!(error = %err, "Route retract failed");
                    self.telemetry.record_install_failure();
                }
            }
            match self.installer.install(node, destination, next_hop) {
                Ok(()) => self.telemetry.record_route_installed(),
                Err(err) => {
                    tracing::warn!(error = %err, "Route install failed");
                    self.telemetry.record_install_failure();
                }
            }
        }
    }

    /// Build the graph the next tick would see, without side effects
    pub fn preview_graph(&mut self, now: Duration) -> RoutingGraph {
        let snapshot = TopologySnapshot::new(self.topology.positions(now), self.max_range);
        self.builder.build(&snapshot, &self.ledger)
    }

    pub fn ledger(&self) -> &TrustLedger {
        &self.ledger
    }

    pub fn flows(&self) -> &FlowRegistry {
        &self.flows
    }

    pub fn telemetry(&self) -> &MeshTelemetry {
        &self.telemetry
    }

    pub fn heartbeat(&self) -> &Heartbeat {
        &self.heartbeat
    }

    /// Snapshot taken at the latest tick
    pub fn snapshot(&self) -> &TopologySnapshot {
        &self.snapshot
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut T {
        &mut self.topology
    }

    pub fn installer(&self) -> &R {
        &self.installer
    }

    pub fn installer_mut(&mut self) -> &mut R {
        &mut self.installer
    }
}
