//! Mesh telemetry
//!
//! Injected, write-only counters for analysis and logging. Nothing in the
//! routing engine reads them back.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    phy_drops: AtomicU64,
    network_drops: AtomicU64,
    malicious_drops: AtomicU64,
    route_install_skips: AtomicU64,
    trust_penalties: AtomicU64,
    routes_installed: AtomicU64,
    routes_retracted: AtomicU64,
    install_failures: AtomicU64,
    heartbeats: AtomicU64,
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Failures reported by the physical layer
    pub phy_drops: u64,
    /// Failures reported by the network layer
    pub network_drops: u64,
    /// Failures the host attributes to a node it knows is malicious
    pub malicious_drops: u64,
    /// Flows left un-routed for a tick because no path existed
    pub route_install_skips: u64,
    /// Drops that decayed link trust
    pub trust_penalties: u64,
    pub routes_installed: u64,
    pub routes_retracted: u64,
    pub install_failures: u64,
    pub heartbeats: u64,
}

/// Cloneable handle to a shared set of counters
#[derive(Debug, Clone, Default)]
pub struct MeshTelemetry {
    counters: Arc<Counters>,
}

impl MeshTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_phy_drop(&self) {
        self.counters.phy_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_drop(&self) {
        self.counters.network_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malicious_drop(&self) {
        self.counters.malicious_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_install_skip(&self) {
        self.counters.route_install_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trust_penalty(&self) {
        self.counters.trust_penalties.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_route_installed(&self) {
        self.counters.routes_installed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_route_retracted(&self) {
        self.counters.routes_retracted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_install_failure(&self) {
        self.counters.install_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_heartbeat(&self) {
        self.counters.heartbeats.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let c = &self.counters;
        TelemetrySnapshot {
            phy_drops: c.phy_drops.load(Ordering::Relaxed),
            network_drops: c.network_drops.load(Ordering::Relaxed),
            malicious_drops: c.malicious_drops.load(Ordering::Relaxed),
            route_install_skips: c.route_install_skips.load(Ordering::Relaxed),
            trust_penalties: c.trust_penalties.load(Ordering::Relaxed),
            routes_installed: c.routes_installed.load(Ordering::Relaxed),
            routes_retracted: c.routes_retracted.load(Ordering::Relaxed),
            install_failures: c.install_failures.load(Ordering::Relaxed),
            heartbeats: c.heartbeats.load(Ordering::Relaxed),
        }
    }
}
