//! Core error types

use thiserror::Error;

/// Core error type for TrustRoute
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating a [`crate::RoutingConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML document could not be parsed
    #[cfg(feature = "toml")]
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value outside its permitted range
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        /// Offending field name
        field: &'static str,
        /// Human-readable constraint that was violated
        reason: String,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
