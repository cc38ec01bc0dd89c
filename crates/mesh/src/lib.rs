//! TrustRoute Mesh - Trust-aware routing for mobile wireless networks
//!
//! Computes multi-hop routes in a network where some nodes silently drop
//! traffic, without knowing in advance which ones.
//!
//! # Core Components
//!
//! - **Topology**: Host-supplied node positions turned into a per-tick snapshot
//! - **Routing Graph**: Edge weights from hop count (baseline) or SNR plus trust (proposed)
//! - **Shortest Path**: Dijkstra per registered flow
//! - **Event Ingestion**: Delivery successes and drops folded into the trust ledger
//! - **Control Loop**: Fixed-period rebuild, recompute and route installation
//!
//! # Design Principles
//!
//! 1. **Pure dynamic detection**: Only observed drops shape trust; no ground truth reaches the cost function
//! 2. **Always available**: Trust has a floor, so no link is ever fully isolated
//! 3. **Single writer**: The ledger is mutated only by the loop that owns it
//!
//! # Example Usage
//!
//! ```rust
//! use std::time::Duration;
//! use trustroute_core::{FlowEndpoint, NodeId, Position, RoutingConfig};
//! use trustroute_mesh::{ControlLoop, ForwardingTables, MeshTelemetry, StaticTopology};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let topology: StaticTopology = (0..3)
//!     .map(|i| (NodeId(i), Position::new(100.0 * i as f64, 0.0, 0.0)))
//!     .collect();
//! let mut control = ControlLoop::new(
//!     &RoutingConfig::default(),
//!     topology,
//!     ForwardingTables::new(),
//!     MeshTelemetry::new(),
//! )?;
//! control.register_flow(FlowEndpoint::new(NodeId(0), NodeId(2)));
//! control.advance_to(Duration::from_millis(100));
//! assert!(control.installer().next_hop(NodeId(0), NodeId(2)).is_some());
//! # Ok(())
//! # }
//! ```

pub mod control;
pub mod error;
pub mod forwarding;
pub mod ingestion;
pub mod path;
pub mod routing;
pub mod telemetry;
pub mod topology;

// Re-export main types
pub use control::{ControlLoop, Heartbeat, TickReport};
pub use error::{MeshError, MeshResult};
pub use forwarding::{ForwardingTables, RouteEntry, RouteInstaller};
pub use ingestion::{
    event_queue, DeliveryEvent, DeliveryOutcome, DropLayer, EventIngestionAdapter, EventQueue,
    EventSender, EventSource, FlowRegistry,
};
pub use path::{Route, ShortestPathSolver};
pub use routing::{CostModel, Edge, RoutingGraph, RoutingGraphBuilder};
pub use telemetry::{MeshTelemetry, TelemetrySnapshot};
pub use topology::{Positions, StaticTopology, TopologyProvider, TopologySnapshot};
