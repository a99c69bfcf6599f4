use std::path::PathBuf;

use anyhow::{ensure, Result};
use asicbench_common::error::HarnessError;

/// A host path bind-mounted into the workload container.
#[derive(Debug, Clone)]
pub struct Mount {
    pub host: PathBuf,
    pub container: PathBuf,
}

/// Structured description of the isolated execution environment for the
/// benchmark. Validated before anything is spawned; only `to_argv` turns it
/// into the container runtime's textual argument vector.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    pub image: String,
    pub mounts: Vec<Mount>,
    pub devices: Vec<PathBuf>,
    pub env: Vec<(String, String)>,
    pub entrypoint: String,
    /// Shell command executed inside the container via `<entrypoint> -c`.
    pub command: String,
    pub use_sudo: bool,
}

impl LaunchSpec {
    /// Precondition check: everything the container needs on the host must
    /// exist before launch, so a missing model directory or device node
    /// aborts with an actionable message instead of a mid-run failure.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.image.is_empty(), "launch spec has no container image");
        ensure!(!self.command.is_empty(), "launch spec has no workload command");
        ensure!(!self.entrypoint.is_empty(), "launch spec has no entrypoint");

        for mount in &self.mounts {
            if !mount.host.exists() {
                return Err(HarnessError::MissingPath(mount.host.clone()).into());
            }
        }
        for device in &self.devices {
            if !device.exists() {
                return Err(HarnessError::MissingPath(device.clone()).into());
            }
        }
        Ok(())
    }

    pub fn to_argv(&self) -> Vec<String> {
        let mut argv: Vec<String> = Vec::new();
        if self.use_sudo {
            argv.push("sudo".into());
            argv.push("-E".into());
        }
        argv.push("docker".into());
        argv.push("run".into());
        argv.push("--rm".into());

        for mount in &self.mounts {
            argv.push("-v".into());
            argv.push(format!(
                "{}:{}",
                mount.host.display(),
                mount.container.display()
            ));
        }
        for device in &self.devices {
            argv.push("--device".into());
            argv.push(device.display().to_string());
        }
        for (key, value) in &self.env {
            argv.push("-e".into());
            argv.push(format!("{key}={value}"));
        }

        argv.push("--entrypoint".into());
        argv.push(self.entrypoint.clone());
        argv.push(self.image.clone());
        argv.push("-c".into());
        argv.push(self.command.clone());
        argv
    }

    pub fn rendered(&self) -> String {
        self.to_argv().join(" ")
    }
}
