use std::path::PathBuf;

use asicbench_common::types::TopologyClass;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Clone)]
#[clap(
    name = "asicbench",
    about = "A harness for running accelerator benchmarks with throttler accounting",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./asicbench.toml when present)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a benchmark with counter snapshots and the telemetry sidecar
    Run(RunArgs),

    /// Run a benchmark with counter snapshots only, no telemetry sidecar
    Counters(RunArgs),

    /// Run a benchmark with the telemetry sidecar only, no counter snapshots
    Telemetry(RunArgs),

    /// Read and print the current throttler counters without running anything
    Snapshot {
        /// Product configuration to validate the attached fleet against
        #[clap(long, short, value_enum, default_value_t = TopologyClass::P100)]
        topology: TopologyClass,
    },

    /// Show the resolved configuration and where each layer came from
    Info,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Benchmark command to run inside the container; prompted for if absent
    #[clap(long, short)]
    pub command: Option<String>,

    /// Product configuration to validate the attached fleet against
    #[clap(long, short, value_enum, default_value_t = TopologyClass::P100)]
    pub topology: TopologyClass,

    /// Wall-clock budget per run in minutes, warm-up included
    #[clap(long)]
    pub timeout: Option<f64>,

    /// Name prefix for the run directory
    #[clap(long, default_value = "run")]
    pub label: String,
}
