use std::path::PathBuf;

use thiserror::Error;

/// Contractual failures of the harness. Orchestration code propagates these
/// through `anyhow`, callers that need to branch downcast back to this enum.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("topology mismatch for {class}: expected {expected} device(s), detected {detected}")]
    TopologyMismatch {
        class: String,
        expected: usize,
        detected: usize,
    },

    #[error("failed to read counter {counter} on device {device}: {source}")]
    DeviceRead {
        device: usize,
        counter: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("no artifact file available to receive the delta record")]
    NoArtifactTarget,

    #[error("required executable `{0}` was not found in PATH")]
    MissingDependency(String),

    #[error("required path {0} does not exist")]
    MissingPath(PathBuf),

    #[error("run directory {0} already exists")]
    RunDirCollision(PathBuf),
}
