use anyhow::{bail, Context, Result};
use asicbench_common::error::HarnessError;
use tokio::process::Command;
use tracing::info;

/// Clears the throttler counters by invoking the external reset utility
/// (`tt-smi -r`). Exit code zero is the only success signal; on failure the
/// utility's stderr is surfaced verbatim to the operator.
pub async fn reset_counters(utility: &str) -> Result<()> {
    which::which(utility)
        .map_err(|_| HarnessError::MissingDependency(utility.to_string()))?;

    let output = Command::new(utility)
        .arg("-r")
        .output()
        .await
        .with_context(|| format!("failed to invoke `{utility} -r`"))?;

    if !output.status.success() {
        bail!(
            "counter reset via `{utility} -r` failed:\n{}",
            String::from_utf8_lossy(&output.stderr).trim_end()
        );
    }

    info!(%utility, "throttler counters reset");
    Ok(())
}
