use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::lifecycle::{stop_gracefully, StopResult};

/// Invocation of the external sampling executable: one process covering the
/// whole device set, with one output file per device and its own diagnostic
/// log, distinct from the workload log.
#[derive(Debug, Clone)]
pub struct SidecarSpec {
    pub executable: PathBuf,
    pub sample_period_ms: u64,
    pub device_ids: Vec<usize>,
    pub output_paths: Vec<PathBuf>,
    pub log_path: PathBuf,
    /// How long after spawn to confirm the process is still alive.
    pub confirm_window: Duration,
}

pub struct SidecarHandle {
    child: Child,
}

impl SidecarHandle {
    /// Two-phase shutdown: cooperative signal, bounded grace wait, then
    /// forced kill. Forcing immediately risks truncated sample files;
    /// waiting forever risks hanging the harness.
    pub async fn stop(mut self, grace: Duration) -> Result<StopResult> {
        stop_gracefully(&mut self.child, grace).await
    }
}

/// Starts the sidecar. Returns `None` (with a warning) if the process dies
/// within the confirmation window; the run then continues without telemetry.
pub async fn start(spec: &SidecarSpec) -> Result<Option<SidecarHandle>> {
    let log = std::fs::File::create(&spec.log_path)
        .with_context(|| format!("failed to create sidecar log {}", spec.log_path.display()))?;
    let err_log = log.try_clone()?;

    let devices = spec
        .device_ids
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut cmd = Command::new(&spec.executable);
    cmd.arg("--delay")
        .arg(spec.sample_period_ms.to_string())
        .arg("--devices")
        .arg(devices)
        .stdout(std::process::Stdio::from(log))
        .stderr(std::process::Stdio::from(err_log))
        .kill_on_drop(true);
    for path in &spec.output_paths {
        cmd.arg("--output").arg(path);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to launch sidecar `{}`", spec.executable.display()))?;

    tokio::time::sleep(spec.confirm_window).await;
    if let Some(status) = child.try_wait()? {
        warn!(%status, "telemetry sidecar exited immediately; continuing without telemetry");
        return Ok(None);
    }

    info!(pid = ?child.id(), devices = spec.device_ids.len(), "telemetry sidecar running");
    Ok(Some(SidecarHandle { child }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn spec(dir: &TempDir, executable: PathBuf) -> SidecarSpec {
        SidecarSpec {
            executable,
            sample_period_ms: 50,
            device_ids: vec![0],
            output_paths: vec![dir.path().join("telemetry.csv")],
            log_path: dir.path().join("sidecar.log"),
            confirm_window: Duration::from_millis(300),
        }
    }

    #[tokio::test]
    async fn long_lived_sidecar_survives_confirmation_and_stops() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(&dir, "sampler", "#!/bin/sh\nwhile :; do sleep 0.1; done\n");

        let handle = start(&spec(&dir, exe)).await.unwrap().expect("sidecar alive");
        let result = handle.stop(Duration::from_secs(5)).await.unwrap();
        assert_eq!(result, StopResult::Exited(None));
    }

    #[tokio::test]
    async fn immediate_exit_is_reported_as_absent() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(&dir, "sampler", "#!/bin/sh\nexit 1\n");

        let handle = start(&spec(&dir, exe)).await.unwrap();
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn diagnostics_land_in_the_sidecar_log() {
        let dir = TempDir::new().unwrap();
        let exe = write_script(&dir, "sampler", "#!/bin/sh\necho 'sampling device 0'\nsleep 2\n");
        let s = spec(&dir, exe);

        let handle = start(&s).await.unwrap().expect("sidecar alive");
        let _ = handle.stop(Duration::from_secs(5)).await.unwrap();

        let log = std::fs::read_to_string(&s.log_path).unwrap();
        assert!(log.contains("sampling device 0"));
    }
}
