use anyhow::{Context, Result};
use asicbench_client::config_manager::{Config, ConfigLoader};
use asicbench_client::harness::{BenchmarkHarness, RunMode};
use asicbench_client::sink::ConsoleSink;
use asicbench_common::types::{RunOutcome, TopologyClass};
use asicbench_common::{info_message, success_message, warning_message, Colorize};
use asicbench_counters::device::TenstorrentAccess;
use clap::Parser;

use crate::commands::{Cli, Commands, RunArgs};
use crate::display;
use crate::interactive::InteractiveRunArgs;
use crate::logging::setup_logging;

/// Parses the command line and dispatches it. Returns the process exit code:
/// zero for a clean run, one for an interrupted or errored one.
pub async fn process_cli() -> Result<i32> {
    let cli = Cli::parse();
    let config = ConfigLoader::load_config(cli.config.as_deref())?;

    std::fs::create_dir_all(&config.base_output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.base_output_dir.display()
        )
    })?;
    setup_logging(&config.base_output_dir)?;

    match cli.command {
        Commands::Run(args) => run_benchmark(RunMode::Full, args, config).await,
        Commands::Counters(args) => run_benchmark(RunMode::CountersOnly, args, config).await,
        Commands::Telemetry(args) => run_benchmark(RunMode::TelemetryOnly, args, config).await,
        Commands::Snapshot { topology } => print_snapshot(topology, config).await,
        Commands::Info => {
            print_config_info(&config);
            Ok(0)
        }
    }
}

async fn run_benchmark(mode: RunMode, args: RunArgs, config: Config) -> Result<i32> {
    let args = InteractiveRunArgs::from_partial(args)
        .prompt_missing()
        .into_finalized();

    let spec = config.launch_spec(&args.command, args.topology);
    let access = Box::new(TenstorrentAccess::new(config.device_root.clone()));
    let harness = BenchmarkHarness::new(config, args.topology, access);
    harness.check_preconditions(mode, &spec)?;

    info_message!("launching: {}", spec.rendered());
    let mut sink = ConsoleSink;
    let report = harness
        .run(
            mode,
            &spec.to_argv(),
            args.timeout_minutes,
            &args.label,
            &mut sink,
        )
        .await?;

    if let Some(dir) = &report.run_dir {
        info_message!("run artifacts in {}", dir.display());
    }
    if let Some(outcome) = &report.outcome {
        info_message!("workload {}", outcome);
    }
    if report.sidecar_absent {
        warning_message!("telemetry sidecar was not running; this run has no telemetry files");
    }
    if let Some(before) = &report.before {
        display::print_snapshot("Throttler counters before", before);
    }
    if let Some(after) = &report.after {
        display::print_snapshot("Throttler counters after", after);
    }
    if let Some(delta) = &report.delta {
        display::print_delta(delta);
    }
    if let Some(target) = &report.published_to {
        success_message!("delta record prepended to {}", target.display());
    }

    if report.interrupted {
        warning_message!("run interrupted; artifacts may be incomplete");
        return Ok(1);
    }
    Ok(match report.outcome {
        Some(RunOutcome::Errored) => 1,
        _ => 0,
    })
}

async fn print_snapshot(topology: TopologyClass, config: Config) -> Result<i32> {
    let access = Box::new(TenstorrentAccess::new(config.device_root.clone()));
    let harness = BenchmarkHarness::new(config, topology, access);
    let mut sink = ConsoleSink;
    let report = harness
        .run(RunMode::SnapshotOnly, &[], 0.0, "snapshot", &mut sink)
        .await?;

    if let Some(snapshot) = &report.before {
        display::print_snapshot("Throttler counters", snapshot);
    }
    Ok(0)
}

fn print_config_info(config: &Config) {
    info_message!("config sources: {}", config.config_sources.join(", "));
    println!("  base_output_dir:    {}", config.base_output_dir.display());
    println!("  container_image:    {}", config.container_image);
    println!("  reset_utility:      {}", config.reset_utility);
    println!("  sidecar_executable: {}", config.sidecar_executable);
    println!("  device_root:        {}", config.device_root.display());
    println!("  warm_up_seconds:    {}", config.warm_up_seconds);
    println!("  use_sudo:           {}", config.use_sudo);
}
