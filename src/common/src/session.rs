use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::constants::{RUN_MANIFEST_FILE, SIDECAR_LOG_FILE, WORKLOAD_LOG_FILE};
use crate::error::HarnessError;

/// One run's exclusive slice of the output tree. The directory name embeds a
/// millisecond timestamp so back-to-back invocations never collide; an
/// existing directory is an error, never reused.
#[derive(Debug)]
pub struct RunSession {
    dir: PathBuf,
    run_id: String,
    label: String,
    started_at: DateTime<Utc>,
}

/// Context written to `run.json` when the session is created, so a run
/// directory is self-describing after the fact.
#[derive(Debug, Serialize)]
pub struct RunManifest {
    pub run_id: String,
    pub label: String,
    pub start_time: String,
    pub topology: Option<String>,
    pub timeout_minutes: Option<f64>,
    pub warm_up_seconds: u64,
    pub command: Option<String>,
}

impl RunSession {
    pub fn create(base_dir: &Path, label: &str) -> Result<Self> {
        fs::create_dir_all(base_dir)
            .with_context(|| format!("failed to create base output dir {}", base_dir.display()))?;

        let started_at = Utc::now();
        let dir = base_dir.join(format!(
            "{label}_{}",
            started_at.format("%Y%m%d_%H%M%S_%3f")
        ));
        if dir.exists() {
            return Err(HarnessError::RunDirCollision(dir).into());
        }
        fs::create_dir(&dir)
            .with_context(|| format!("failed to create run dir {}", dir.display()))?;

        Ok(Self {
            dir,
            run_id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            started_at,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn workload_log(&self) -> PathBuf {
        self.dir.join(WORKLOAD_LOG_FILE)
    }

    pub fn sidecar_log(&self) -> PathBuf {
        self.dir.join(SIDECAR_LOG_FILE)
    }

    /// Per-device telemetry file: `telemetry.csv` for device 0,
    /// `telemetry_<n>.csv` for the rest.
    pub fn telemetry_file(&self, device: usize) -> PathBuf {
        if device == 0 {
            self.dir.join("telemetry.csv")
        } else {
            self.dir.join(format!("telemetry_{device}.csv"))
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(RUN_MANIFEST_FILE)
    }

    pub fn write_manifest(&self, manifest: &RunManifest) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        fs::write(self.manifest_path(), json).context("failed to write run manifest")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_unique_directories() {
        let base = TempDir::new().unwrap();
        let a = RunSession::create(base.path(), "llama").unwrap();
        let b = RunSession::create(base.path(), "llama").unwrap();
        assert_ne!(a.dir(), b.dir());
        assert!(a.dir().is_dir());
        assert!(b.dir().is_dir());
    }

    #[test]
    fn artifact_paths_live_under_run_dir() {
        let base = TempDir::new().unwrap();
        let session = RunSession::create(base.path(), "test").unwrap();

        assert_eq!(session.workload_log(), session.dir().join("docker_output.log"));
        assert_eq!(session.telemetry_file(0), session.dir().join("telemetry.csv"));
        assert_eq!(session.telemetry_file(3), session.dir().join("telemetry_3.csv"));
        assert_eq!(session.sidecar_log(), session.dir().join("sidecar.log"));
    }

    #[test]
    fn manifest_round_trips_as_json() {
        let base = TempDir::new().unwrap();
        let session = RunSession::create(base.path(), "test").unwrap();
        session
            .write_manifest(&RunManifest {
                run_id: session.run_id().to_string(),
                label: session.label().to_string(),
                start_time: session.started_at().to_rfc3339(),
                topology: Some("p100".into()),
                timeout_minutes: Some(5.0),
                warm_up_seconds: 10,
                command: Some("pytest models/demo.py".into()),
            })
            .unwrap();

        let raw = fs::read_to_string(session.manifest_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["label"], "test");
        assert_eq!(value["topology"], "p100");
    }
}
