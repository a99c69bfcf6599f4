use std::path::Path;

use anyhow::{Context, Result};
use asicbench_common::constants::HARNESS_LOG_FILE;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    prelude::*,
    EnvFilter,
};

/// Routes all tracing output to `harness.log` in the base output directory,
/// keeping stdout free for workload lines and result tables.
pub fn setup_logging(base_output_dir: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = RollingFileAppender::new(Rotation::NEVER, base_output_dir, HARNESS_LOG_FILE);

    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_level(true)
        .with_timer(SystemTime)
        .with_writer(file_appender);

    let subscriber = tracing_subscriber::registry().with(filter).with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    tracing::info!(
        "Logging system initialized. Writing to {}",
        base_output_dir.join(HARNESS_LOG_FILE).display()
    );

    Ok(())
}
