//! Error types for TrustRoute mesh operations.
//!
//! The routing engine itself never fails; these errors cover the fallible
//! seams around it (route installation, configuration, serialization).

use thiserror::Error;
use trustroute_core::{ConfigError, NodeId};

/// Errors that can occur in mesh operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The external route installer refused a forwarding-table change
    #[error("Route installation failed on {node} for destination {destination}: {reason}")]
    InstallFailed {
        node: NodeId,
        destination: NodeId,
        reason: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;
