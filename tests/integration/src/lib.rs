//! Integration tests for the trust-aware routing engine
//!
//! This test suite validates:
//! - Route selection around distrusted links (proposed vs baseline)
//! - Blackhole classification and avoidance from observed drops only
//! - Silent handling of unreachable destinations
//! - Deterministic graph rebuilds
//! - Control-loop convergence when a relay silently drops traffic


#[cfg(test)]
mod routing_scenarios;

#[cfg(test)]
mod control_loop_tests;
