//! TrustRoute node simulator
//!
//! Runs the trust-aware routing engine against a synthetic mobile network
//! with silent blackhole nodes and reports packet delivery per mode.

mod mobility;
mod report;
mod simulation;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use report::SimReport;
use simulation::{SimConfig, Simulation};
use std::path::PathBuf;
use std::time::Duration;
use trustroute_core::{logging, RoutingConfig, RoutingMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Baseline,
    Proposed,
    Both,
}

impl ModeArg {
    fn modes(self) -> Vec<RoutingMode> {
        match self {
            ModeArg::Baseline => vec![RoutingMode::Baseline],
            ModeArg::Proposed => vec![RoutingMode::Proposed],
            ModeArg::Both => vec![RoutingMode::Baseline, RoutingMode::Proposed],
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "trustroute-node", version, about = "Trust-aware routing under blackhole attack")]
struct Cli {
    /// Routing config (TOML); defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Routing mode(s) to run with the same seed. Without this flag the
    /// config file's mode is used, or both modes when no config is given.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Number of nodes
    #[arg(long, default_value_t = 20)]
    nodes: u32,

    /// Number of silent blackhole nodes
    #[arg(long, default_value_t = 3)]
    blackholes: u32,

    /// Number of source/destination flows
    #[arg(long, default_value_t = 4)]
    flows: u32,

    /// Simulated duration in seconds
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,

    /// Side of the square area in metres
    #[arg(long, default_value_t = 600.0)]
    area: f64,

    /// Maximum node speed in m/s
    #[arg(long, default_value_t = 5.0)]
    max_speed: f64,

    /// Packet origination interval per flow
    #[arg(long, default_value_t = 50)]
    packet_interval_ms: u64,

    /// RNG seed for mobility, blackhole placement and losses
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Print reports as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let base = match &cli.config {
        Some(path) => RoutingConfig::from_file(path)
            .with_context(|| format!("loading routing config from {}", path.display()))?,
        None => RoutingConfig::default(),
    };

    let sim = SimConfig {
        nodes: cli.nodes,
        blackholes: cli.blackholes,
        flows: cli.flows,
        duration: Duration::from_secs(cli.duration_secs),
        area: cli.area,
        max_speed: cli.max_speed,
        packet_interval: Duration::from_millis(cli.packet_interval_ms),
        seed: cli.seed,
        ..SimConfig::default()
    };
    sim.validate().context("invalid scenario")?;

    let modes = match cli.mode {
        Some(arg) => arg.modes(),
        None if cli.config.is_some() => vec![base.mode],
        None => ModeArg::Both.modes(),
    };

    let mut reports: Vec<SimReport> = Vec::new();
    for mode in modes {
        let routing = RoutingConfig {
            mode,
            ..base.clone()
        };
        let report = Simulation::new(sim.clone(), routing)
            .with_context(|| format!("setting up {mode} run"))?
            .run();
        report.log();
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}
