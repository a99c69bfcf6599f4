use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use asicbench_common::constants::{
    DEFAULT_DEVICE_ROOT, DEFAULT_RESET_UTILITY, DEFAULT_SIDECAR_CONFIRM_WINDOW_SECS,
    DEFAULT_SIDECAR_EXECUTABLE, DEFAULT_SIDECAR_GRACE_SECS, DEFAULT_SIDECAR_SAMPLE_PERIOD_MS,
    DEFAULT_STOP_GRACE_SECS, DEFAULT_WARM_UP_SECS,
};
use asicbench_common::types::TopologyClass;
use config::Config as RConfig;
use serde::{Deserialize, Serialize};

use crate::launch::{LaunchSpec, Mount};

const DEFAULT_IMAGE: &str =
    "ghcr.io/tenstorrent/tt-metal/upstream-tests-bh:v0.62.0-dev20251010-12-g23761277d0";
const DEFAULT_ENTRYPOINT: &str = "/bin/bash";
const DEFAULT_BOOTSTRAP: &str =
    "source /opt/venv/bin/activate && pip3 install -r models/tt_transformers/requirements.txt";
const DEFAULT_HUGEPAGES_DIR: &str = "/dev/hugepages-1G";
const DEFAULT_MODEL_DIR_NAME: &str = "LLAMA_31_8B_INSTRUCT_DIR";
const DEFAULT_MODEL_DIR_ENV: &str = "LLAMA_DIR";
const DEFAULT_RUNS_DIR_NAME: &str = "asicbench_runs";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub base_output_dir: PathBuf,

    pub warm_up_seconds: u64,
    pub stop_grace_seconds: u64,

    pub sidecar_executable: String,
    pub sidecar_sample_period_ms: u64,
    pub sidecar_grace_seconds: u64,
    pub sidecar_confirm_window_seconds: u64,

    pub reset_utility: String,
    pub device_root: PathBuf,

    pub container_image: String,
    pub container_entrypoint: String,
    /// Command prefix run before the workload command inside the container.
    pub container_bootstrap: String,
    pub hugepages_dir: String,
    pub model_dir: Option<PathBuf>,
    pub model_dir_env: String,
    pub use_sudo: bool,

    pub config_sources: Vec<String>,
}

impl Config {
    pub fn warm_up(&self) -> Duration {
        Duration::from_secs(self.warm_up_seconds)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_seconds)
    }

    pub fn sidecar_grace(&self) -> Duration {
        Duration::from_secs(self.sidecar_grace_seconds)
    }

    pub fn sidecar_confirm_window(&self) -> Duration {
        Duration::from_secs(self.sidecar_confirm_window_seconds)
    }

    /// Builds the structured launch spec for a workload command: hugepages
    /// and model-directory mounts, device passthrough for every ASIC the
    /// topology implies, and the bootstrap prefix ahead of the command.
    pub fn launch_spec(&self, command: &str, topology: TopologyClass) -> LaunchSpec {
        let mut mounts = vec![Mount {
            host: PathBuf::from(&self.hugepages_dir),
            container: PathBuf::from(&self.hugepages_dir),
        }];
        let mut env = Vec::new();
        if let Some(model_dir) = &self.model_dir {
            mounts.push(Mount {
                host: model_dir.clone(),
                container: model_dir.clone(),
            });
            env.push((
                self.model_dir_env.clone(),
                model_dir.display().to_string(),
            ));
        }

        let devices = (0..topology.expected_devices())
            .map(|index| self.device_root.join(index.to_string()))
            .collect();

        let command = if self.container_bootstrap.is_empty() {
            command.to_string()
        } else {
            format!("{} && {command}", self.container_bootstrap)
        };

        LaunchSpec {
            image: self.container_image.clone(),
            mounts,
            devices,
            env,
            entrypoint: self.container_entrypoint.clone(),
            command,
            use_sudo: self.use_sudo,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Layered load: built-in defaults, then the TOML file (explicit path or
    /// `asicbench.toml` in the working directory), then `ASICBENCH_*`
    /// environment overrides.
    pub fn load_config(path: Option<&Path>) -> Result<Config> {
        let default_model_dir = dirs::home_dir()
            .map(|home| home.join(DEFAULT_MODEL_DIR_NAME))
            .map(|p| p.display().to_string());
        let default_output_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(DEFAULT_RUNS_DIR_NAME)
            .display()
            .to_string();

        let mut builder = RConfig::builder()
            .set_default("base_output_dir", default_output_dir)?
            .set_default("warm_up_seconds", DEFAULT_WARM_UP_SECS)?
            .set_default("stop_grace_seconds", DEFAULT_STOP_GRACE_SECS)?
            .set_default("sidecar_executable", DEFAULT_SIDECAR_EXECUTABLE)?
            .set_default("sidecar_sample_period_ms", DEFAULT_SIDECAR_SAMPLE_PERIOD_MS)?
            .set_default("sidecar_grace_seconds", DEFAULT_SIDECAR_GRACE_SECS)?
            .set_default(
                "sidecar_confirm_window_seconds",
                DEFAULT_SIDECAR_CONFIRM_WINDOW_SECS,
            )?
            .set_default("reset_utility", DEFAULT_RESET_UTILITY)?
            .set_default("device_root", DEFAULT_DEVICE_ROOT)?
            .set_default("container_image", DEFAULT_IMAGE)?
            .set_default("container_entrypoint", DEFAULT_ENTRYPOINT)?
            .set_default("container_bootstrap", DEFAULT_BOOTSTRAP)?
            .set_default("hugepages_dir", DEFAULT_HUGEPAGES_DIR)?
            .set_default("model_dir", default_model_dir)?
            .set_default("model_dir_env", DEFAULT_MODEL_DIR_ENV)?
            .set_default("use_sudo", true)?
            .set_default::<&str, Vec<&str>>("config_sources", vec![])?;

        let mut sources = vec!["defaults".to_string()];
        match path {
            Some(file) => {
                builder = builder.add_source(config::File::from(file));
                sources.push(file.display().to_string());
            }
            None => {
                if Path::new("asicbench.toml").exists() {
                    builder = builder.add_source(config::File::with_name("asicbench"));
                    sources.push("asicbench.toml".to_string());
                }
            }
        }
        builder = builder.add_source(config::Environment::with_prefix("ASICBENCH"));

        let mut config: Config = builder
            .build()?
            .try_deserialize()
            .context("failed to parse config")?;
        config.config_sources = sources;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_are_complete() {
        let config = ConfigLoader::load_config(None).unwrap();
        assert_eq!(config.warm_up_seconds, 10);
        assert_eq!(config.reset_utility, "tt-smi");
        assert!(config.base_output_dir.ends_with("asicbench_runs"));
    }

    #[test]
    #[serial]
    fn file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("bench.toml");
        std::fs::write(&file, "warm_up_seconds = 3\nuse_sudo = false\n").unwrap();

        let config = ConfigLoader::load_config(Some(&file)).unwrap();
        assert_eq!(config.warm_up_seconds, 3);
        assert!(!config.use_sudo);
        // untouched keys keep their defaults
        assert_eq!(config.sidecar_grace_seconds, 10);
    }

    #[test]
    #[serial]
    fn launch_spec_passes_through_every_device() {
        let mut config = ConfigLoader::load_config(None).unwrap();
        config.model_dir = None;
        config.container_bootstrap.clear();

        let spec = config.launch_spec("pytest demo.py", TopologyClass::P300);
        assert_eq!(spec.devices.len(), 2);
        assert_eq!(spec.devices[1], config.device_root.join("1"));
        assert_eq!(spec.command, "pytest demo.py");
    }

    #[test]
    #[serial]
    fn bootstrap_prefixes_the_workload_command() {
        let config = ConfigLoader::load_config(None).unwrap();
        let spec = config.launch_spec("pytest demo.py", TopologyClass::P100);
        assert!(spec.command.starts_with("source /opt/venv/bin/activate"));
        assert!(spec.command.ends_with("&& pytest demo.py"));
    }
}
