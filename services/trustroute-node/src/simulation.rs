//! Discrete-event host driving the routing engine.
//!
//! Plays the part of the simulator around the engine: it moves nodes,
//! originates packets for each flow, forwards them along the installed
//! forwarding tables and reports every hop outcome through the engine's
//! event queue. Blackhole ground truth lives here and never reaches the
//! engine except through the drops it causes.

use crate::mobility::RandomWaypoint;
use crate::report::SimReport;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};
use std::time::Duration;
use trustroute_core::{FlowEndpoint, NodeId, RoutingConfig};
use trustroute_mesh::{
    ControlLoop, DeliveryEvent, DropLayer, EventSender, ForwardingTables, MeshResult,
    MeshTelemetry, TopologyProvider,
};

/// Packets are discarded after this many hops
const MAX_HOPS: usize = 32;
/// Loss probability at the edge of radio range
const EDGE_LOSS: f64 = 0.1;
/// Upper bound on the synthetic SNR estimate
const MAX_SNR: f64 = 100.0;

/// Scenario parameters
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub nodes: u32,
    pub blackholes: u32,
    pub flows: u32,
    pub duration: Duration,
    pub area: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub packet_interval: Duration,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nodes: 20,
            blackholes: 3,
            flows: 4,
            duration: Duration::from_secs(30),
            area: 600.0,
            min_speed: 1.0,
            max_speed: 5.0,
            packet_interval: Duration::from_millis(50),
            seed: 1,
        }
    }
}

impl SimConfig {
    /// Reject scenarios the mobility model or scheduler cannot run
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.area.is_finite() && self.area > 0.0,
            "area must be positive and finite, got {}",
            self.area
        );
        anyhow::ensure!(
            self.min_speed.is_finite() && self.max_speed.is_finite() && self.min_speed >= 0.0,
            "speeds must be finite and non-negative"
        );
        anyhow::ensure!(
            self.max_speed >= self.min_speed,
            "max speed {} is below min speed {}",
            self.max_speed,
            self.min_speed
        );
        anyhow::ensure!(
            !self.packet_interval.is_zero(),
            "packet interval must be positive"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimEvent {
    Heartbeat,
    Originate { flow: usize },
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    at: Duration,
    seq: u64,
    event: SimEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

/// Time-ordered event queue; ties run in scheduling order
#[derive(Debug, Default)]
struct Scheduler {
    queue: BinaryHeap<Reverse<Scheduled>>,
    seq: u64,
}

impl Scheduler {
    fn schedule(&mut self, at: Duration, event: SimEvent) {
        self.seq += 1;
        self.queue.push(Reverse(Scheduled {
            at,
            seq: self.seq,
            event,
        }));
    }

    fn pop(&mut self) -> Option<Scheduled> {
        self.queue.pop().map(|Reverse(s)| s)
    }
}

/// Per-run packet counters kept by the host
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PacketStats {
    pub sent: u64,
    pub delivered: u64,
    pub no_route: u64,
    pub ttl_expired: u64,
    pub blackholed: u64,
    pub phy_lost: u64,
}

/// One simulation run in a single routing mode
pub struct Simulation {
    config: SimConfig,
    routing: RoutingConfig,
    control: ControlLoop<RandomWaypoint, ForwardingTables>,
    flows: Vec<FlowEndpoint>,
    blackholes: BTreeSet<NodeId>,
    events: EventSender,
    scheduler: Scheduler,
    rng: StdRng,
    stats: PacketStats,
}

impl Simulation {
    /// Set up mobility, ground-truth blackholes and flows from the seed
    pub fn new(config: SimConfig, routing: RoutingConfig) -> MeshResult<Self> {
        let mobility = RandomWaypoint::new(
            config.nodes,
            config.area,
            config.min_speed,
            config.max_speed,
            config.seed,
        );
        let mut control = ControlLoop::new(
            &routing,
            mobility,
            ForwardingTables::new(),
            MeshTelemetry::new(),
        )?;

        let mut rng = StdRng::seed_from_u64(config.seed ^ 0x5eed);
        let mut ids: Vec<NodeId> = (0..config.nodes).map(NodeId).collect();
        ids.shuffle(&mut rng);

        let blackhole_count = (config.blackholes as usize).min(ids.len());
        let blackholes: BTreeSet<NodeId> = ids[..blackhole_count].iter().copied().collect();
        let honest = &ids[blackhole_count..];

        let mut flows = Vec::new();
        if honest.len() >= 2 {
            for i in 0..config.flows as usize {
                let source = honest[(2 * i) % honest.len()];
                let destination = honest[(2 * i + 1) % honest.len()];
                let flow = FlowEndpoint::new(source, destination);
                if source != destination && control.register_flow(flow) {
                    flows.push(flow);
                }
            }
        }

        tracing::info!(
            mode = %routing.mode,
            nodes = config.nodes,
            blackholes = ?blackholes,
            flows = flows.len(),
            "Simulation prepared"
        );

        let events = control.event_sender();
        Ok(Self {
            config,
            routing,
            control,
            flows,
            blackholes,
            events,
            scheduler: Scheduler::default(),
            rng,
            stats: PacketStats::default(),
        })
    }

    /// Run to completion and summarise
    pub fn run(mut self) -> SimReport {
        self.scheduler.schedule(Duration::ZERO, SimEvent::Heartbeat);
        for flow in 0..self.flows.len() {
            // Give the first heartbeat a chance to install routes
            self.scheduler
                .schedule(self.config.packet_interval, SimEvent::Originate { flow });
        }

        while let Some(Scheduled { at, event, .. }) = self.scheduler.pop() {
            if at > self.config.duration {
                break;
            }
            match event {
                SimEvent::Heartbeat => {
                    self.control.installer_mut().set_clock(at);
                    self.control.tick(at);
                    self.scheduler
                        .schedule(at + self.routing.heartbeat_period(), SimEvent::Heartbeat);
                }
                SimEvent::Originate { flow } => {
                    self.forward(self.flows[flow], at);
                    self.scheduler
                        .schedule(at + self.config.packet_interval, SimEvent::Originate { flow });
                }
            }
        }
        self.control.stop();

        SimReport::new(
            &self.config,
            self.routing.mode,
            self.stats,
            self.control.telemetry().snapshot(),
            self.blackholes.iter().copied().collect(),
            self.control
                .ledger()
                .blackholes((0..self.config.nodes).map(NodeId)),
            self.control.heartbeat().ticks(),
        )
    }

    /// Carry one packet hop by hop, reporting each outcome
    fn forward(&mut self, flow: FlowEndpoint, now: Duration) {
        self.stats.sent += 1;
        let positions = self.control.topology_mut().positions(now);
        let range = self.routing.max_range;

        let mut node = flow.source;
        let mut previous: Option<NodeId> = None;
        for _ in 0..MAX_HOPS {
            if node == flow.destination {
                self.stats.delivered += 1;
                return;
            }
            if node != flow.source && self.blackholes.contains(&node) {
                self.stats.blackholed += 1;
                self.events.send(
                    DeliveryEvent::failure(node, previous, DropLayer::Network)
                        .attributed_to_malicious(),
                );
                return;
            }
            let Some(next) = self.control.installer().next_hop(node, flow.destination) else {
                self.stats.no_route += 1;
                return;
            };

            let distance = match (positions.get(&node), positions.get(&next)) {
                (Some(a), Some(b)) => a.distance_to(b),
                _ => f64::INFINITY,
            };
            let loss = EDGE_LOSS * (distance / range).powi(4);
            if distance >= range || self.rng.gen_bool(loss.clamp(0.0, 1.0)) {
                self.stats.phy_lost += 1;
                self.events
                    .send(DeliveryEvent::failure(next, None, DropLayer::Phy));
                return;
            }

            let snr = estimate_snr(distance, range, self.routing.default_snr);
            self.events
                .send(DeliveryEvent::success(next, Some(node), snr));
            previous = Some(node);
            node = next;
        }
        self.stats.ttl_expired += 1;
    }
}

/// Synthetic SNR that equals `reference` at the edge of range and grows
/// with the inverse square of distance.
fn estimate_snr(distance: f64, range: f64, reference: f64) -> f64 {
    let d = distance.max(1.0);
    (reference * (range / d).powi(2)).min(MAX_SNR)
}
