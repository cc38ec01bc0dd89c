//! Trust Mesh
//!
//! Behavioural trust inference for links in a mobile wireless network:
//! - Per-link ledger of smoothed signal quality, drop counts and trust
//! - Multiplicative trust decay with a floor, so no link is ever fully isolated
//! - Blackhole classification of nodes from the trust of their incident links
//!
//! Trust is shaped only by observed deliveries and drops. Nothing in this
//! crate accepts prior knowledge of which nodes are malicious.

pub mod classification;
pub mod ledger;
pub mod trust;

pub use classification::NodeClassification;
pub use ledger::{LinkMetric, TrustLedger};
pub use trust::{
    TrustPolicy, BLACKHOLE_MAJORITY, DEFAULT_EMA_ALPHA, DEFAULT_TRUST_DECAY,
    DEFAULT_TRUST_FLOOR, INITIAL_TRUST,
};
