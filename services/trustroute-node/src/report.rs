//! Run summaries

use crate::simulation::{PacketStats, SimConfig};
use serde::Serialize;
use trustroute_core::{NodeId, RoutingMode};
use trustroute_mesh::TelemetrySnapshot;

/// Outcome of one simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub mode: RoutingMode,
    pub seed: u64,
    pub nodes: u32,
    pub duration_secs: f64,
    pub ticks: u64,
    pub packets: PacketStats,
    /// Delivered over sent, 0 when nothing was sent
    pub delivery_ratio: f64,
    pub telemetry: TelemetrySnapshot,
    /// Ground truth configured by the host
    pub actual_blackholes: Vec<NodeId>,
    /// Nodes the engine classified from observed drops
    pub classified_blackholes: Vec<NodeId>,
    /// Classified nodes that really are blackholes
    pub correctly_classified: usize,
}

impl SimReport {
    pub fn new(
        config: &SimConfig,
        mode: RoutingMode,
        packets: PacketStats,
        telemetry: TelemetrySnapshot,
        actual_blackholes: Vec<NodeId>,
        classified_blackholes: Vec<NodeId>,
        ticks: u64,
    ) -> Self {
        let delivery_ratio = if packets.sent > 0 {
            packets.delivered as f64 / packets.sent as f64
        } else {
            0.0
        };
        let correctly_classified = classified_blackholes
            .iter()
            .filter(|node| actual_blackholes.contains(node))
            .count();
        Self {
            mode,
            seed: config.seed,
            nodes: config.nodes,
            duration_secs: config.duration.as_secs_f64(),
            ticks,
            packets,
            delivery_ratio,
            telemetry,
            actual_blackholes,
            classified_blackholes,
            correctly_classified,
        }
    }

    /// Emit the summary through the log
    pub fn log(&self) {
        tracing::info!(
            mode = %self.mode,
            sent = self.packets.sent,
            delivered = self.packets.delivered,
            pdr = %format!("{:.3}", self.delivery_ratio),
            blackholed = self.packets.blackholed,
            phy_lost = self.packets.phy_lost,
            no_route = self.packets.no_route,
            trust_penalties = self.telemetry.trust_penalties,
            classified = ?self.classified_blackholes,
            actual = ?self.actual_blackholes,
            "Run complete"
        );
    }
}
