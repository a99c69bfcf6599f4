use std::time::Duration;

use anyhow::Result;
use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, warn};

/// How a supervised process ended up dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopResult {
    /// Exited on its own or in response to the graceful request. `None` means
    /// it was terminated by a signal.
    Exited(Option<i32>),
    /// Ignored the graceful request past the grace period and was killed.
    Killed,
}

/// Graceful-then-forced stop, shared by the workload and the sidecar:
/// SIGTERM, bounded wait, SIGKILL. Returns only once the process is
/// positively confirmed dead and reaped.
pub async fn stop_gracefully(child: &mut Child, grace: Duration) -> Result<StopResult> {
    if let Some(status) = child.try_wait()? {
        debug!(%status, "process already exited");
        return Ok(StopResult::Exited(status.code()));
    }

    let Some(pid) = child.id() else {
        // Reaped between try_wait and here.
        return Ok(StopResult::Exited(None));
    };

    // SAFETY: pid comes from a live child we own.
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGTERM);
    }

    match timeout(grace, child.wait()).await {
        Ok(status) => {
            let status = status?;
            debug!(%status, "process exited after graceful request");
            Ok(StopResult::Exited(status.code()))
        }
        Err(_) => {
            warn!(pid, grace_secs = grace.as_secs_f64(), "grace period expired, killing");
            child.kill().await?;
            Ok(StopResult::Killed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    fn spawn_sh(script: &str) -> Child {
        Command::new("sh")
            .arg("-c")
            .arg(script)
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn already_exited_child_reports_its_code() {
        let mut child = spawn_sh("exit 3");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let result = stop_gracefully(&mut child, Duration::from_secs(1)).await.unwrap();
        assert_eq!(result, StopResult::Exited(Some(3)));
    }

    #[tokio::test]
    async fn term_responsive_child_exits_within_grace() {
        let mut child = spawn_sh("sleep 30");

        let result = stop_gracefully(&mut child, Duration::from_secs(5)).await.unwrap();
        // sh dies to SIGTERM, so there is no exit code.
        assert_eq!(result, StopResult::Exited(None));
    }

    #[tokio::test]
    async fn term_ignoring_child_is_killed() {
        let mut child = spawn_sh("trap '' TERM; sleep 30");
        // Give the shell a moment to install the trap.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let result = stop_gracefully(&mut child, Duration::from_millis(300)).await.unwrap();
        assert_eq!(result, StopResult::Killed);
    }
}
