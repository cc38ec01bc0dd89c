//! Core types for the TrustRoute routing engine.
//!
//! This crate provides the identifiers, geometry, routing mode and
//! configuration shared by the trust ledger, the mesh routing engine and
//! the host adapters that drive it.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::RoutingConfig;
pub use error::{ConfigError, CoreError, CoreResult};
pub use types::{FlowEndpoint, LinkKey, NodeId, Position, RoutingMode};
