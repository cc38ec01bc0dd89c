//! Event ingestion
//!
//! Translates delivery notifications from the host into trust ledger
//! observations. When the host cannot say which node transmitted, the sender
//! is resolved from the active flow paths; failing that, the observation is
//! applied to every node in range of the receiver. The broadcast fallback
//! trades attribution precision for simplicity and adds measurement noise.

use crate::telemetry::MeshTelemetry;
use crate::topology::TopologySnapshot;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use trustroute_core::{FlowEndpoint, NodeId, RoutingMode};
use trustroute_trust_mesh::TrustLedger;

/// Layer that reported a failed delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropLayer {
    Phy,
    Network,
}

/// Result of one hop delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Success {
        /// Receiver-side SNR estimate; non-positive values are ignored
        snr: f64,
    },
    Failure {
        layer: DropLayer,
        /// Host ground truth, counted in telemetry only
        malicious: bool,
    },
}

/// Delivery notification for the link ending at `receiver`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub receiver: NodeId,
    /// Transmitting node, when the host knows it
    pub sender: Option<NodeId>,
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

impl DeliveryEvent {
    pub fn success(receiver: NodeId, sender: Option<NodeId>, snr: f64) -> Self {
        Self {
            receiver,
            sender,
            outcome: DeliveryOutcome::Success { snr },
        }
    }

    pub fn failure(receiver: NodeId, sender: Option<NodeId>, layer: DropLayer) -> Self {
        Self {
            receiver,
            sender,
            outcome: DeliveryOutcome::Failure {
                layer,
                malicious: false,
            },
        }
    }

    /// Mark a failure as caused by a node the host knows to be malicious
    pub fn attributed_to_malicious(mut self) -> Self {
        if let DeliveryOutcome::Failure { malicious, .. } = &mut self.outcome {
            *malicious = true;
        }
        self
    }
}

/// Registered flows and the path most recently installed for each
#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    flows: Vec<FlowEndpoint>,
    active_paths: Vec<Vec<NodeId>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flow; returns `false` if it was already registered
    pub fn register(&mut self, flow: FlowEndpoint) -> bool {
        if self.flows.contains(&flow) {
            return false;
        }
        self.flows.push(flow);
        self.active_paths.push(Vec::new());
        true
    }

    /// Flows in registration order
    pub fn flows(&self) -> &[FlowEndpoint] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Record the path installed for the flow at `index` this tick
    pub fn set_active_path(&mut self, index: usize, path: Vec<NodeId>) {
        if let Some(slot) = self.active_paths.get_mut(index) {
            *slot = path;
        }
    }

    /// Path installed for `flow`, empty if none
    pub fn active_path(&self, flow: &FlowEndpoint) -> &[NodeId] {
        self.flows
            .iter()
            .position(|f| f == flow)
            .and_then(|i| self.active_paths.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Predecessor of `receiver` on the first active path that contains it
    pub fn resolve_sender(&self, receiver: NodeId) -> Option<NodeId> {
        self.active_paths.iter().find_map(|path| {
            path.windows(2)
                .find(|hop| hop[1] == receiver)
                .map(|hop| hop[0])
        })
    }
}

/// Applies delivery events to the trust ledger
#[derive(Debug, Clone)]
pub struct EventIngestionAdapter {
    mode: RoutingMode,
    telemetry: MeshTelemetry,
}

impl EventIngestionAdapter {
    pub fn new(mode: RoutingMode, telemetry: MeshTelemetry) -> Self {
        Self { mode, telemetry }
    }

    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    /// Apply one event; returns the number of links observed
    pub fn ingest(
        &self,
        ledger: &mut TrustLedger,
        topology: &TopologySnapshot,
        flows: &FlowRegistry,
        event: &DeliveryEvent,
    ) -> usize {
        match event.outcome {
            DeliveryOutcome::Success { snr } => {
                self.on_delivery_success(ledger, topology, flows, event.receiver, snr, event.sender)
            }
            DeliveryOutcome::Failure { layer, malicious } => {
                match layer {
                    DropLayer::Phy => self.telemetry.record_phy_drop(),
                    DropLayer::Network => self.telemetry.record_network_drop(),
                }
                if malicious {
                    self.telemetry.record_malicious_drop();
                }
                self.on_delivery_failure(ledger, topology, flows, event.receiver, event.sender)
            }
        }
    }

    /// Record a successful delivery at `receiver`
    pub fn on_delivery_success(
        &self,
        ledger: &mut TrustLedger,
        topology: &TopologySnapshot,
        flows: &FlowRegistry,
        receiver: NodeId,
        snr: f64,
        sender: Option<NodeId>,
    ) -> usize {
        let senders = attribute(topology, flows, receiver, sender);
        for from in &senders {
            ledger.observe(*from, receiver, snr, false, self.mode.trust_enabled());
        }
        senders.len()
    }

    /// Record a failed delivery at `receiver`
    pub fn on_delivery_failure(
        &self,
        ledger: &mut TrustLedger,
        topology: &TopologySnapshot,
        flows: &FlowRegistry,
        receiver: NodeId,
        sender: Option<NodeId>,
    ) -> usize {
        let senders = attribute(topology, flows, receiver, sender);
        let trust_enabled = self.mode.trust_enabled();
        for from in &senders {
            ledger.observe(*from, receiver, 0.0, true, trust_enabled);
            if trust_enabled {
                self.telemetry.record_trust_penalty();
            }
        }
        senders.len()
    }
}

/// Nodes to charge for an event at `receiver`
fn attribute(
    topology: &TopologySnapshot,
    flows: &FlowRegistry,
    receiver: NodeId,
    sender: Option<NodeId>,
) -> Vec<NodeId> {
    if let Some(sender) = sender.or_else(|| flows.resolve_sender(receiver)) {
        return vec![sender];
    }
    let neighbors = topology.neighbors(receiver);
    tracing::debug!(
        receiver = %receiver,
        neighbors = neighbors.len(),
        "Sender unresolved, attributing to all neighbours"
    );
    neighbors
}

/// Port through which a host environment hands delivery events to the loop.
///
/// One adapter per host: [`EventQueue`] for threaded producers, or any
/// simulator-specific buffer that can yield its pending events.
pub trait EventSource {
    /// Take every pending event, in arrival order
    fn drain_events(&mut self) -> Vec<DeliveryEvent>;
}

/// Create a queue for hosts that deliver events from several threads
pub fn event_queue() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventQueue { rx })
}

/// Cloneable, thread-safe producer side of the event queue
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<DeliveryEvent>,
}

impl EventSender {
    /// Enqueue an event; returns `false` once the consumer is gone
    pub fn send(&self, event: DeliveryEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Single consumer side, drained once per tick
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<DeliveryEvent>,
}

impl EventQueue {
    /// Take every event enqueued so far, in arrival order
    pub fn drain(&mut self) -> Vec<DeliveryEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

impl EventSource for EventQueue {
    fn drain_events(&mut self) -> Vec<DeliveryEvent> {
        self.drain()
    }
}
