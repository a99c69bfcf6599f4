use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use asicbench_common::types::RunOutcome;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::lifecycle::{stop_gracefully, StopResult};
use crate::sink::OutputSink;

type MergedLines = Box<dyn Stream<Item = std::io::Result<String>> + Send + Unpin>;

/// Owns the primary workload's lifecycle: launch with combined output
/// capture, drain-and-log until completion or deadline, and confirm the
/// process dead on every exit path.
pub struct WorkloadController {
    stop_grace: Duration,
}

/// A launched workload plus its merged output stream and run log. The log
/// file is opened once and flushed per line, so a crash preserves a valid
/// prefix of the output.
pub struct RunningWorkload {
    child: Child,
    lines: MergedLines,
    log: std::fs::File,
    pub pid: Option<u32>,
}

impl RunningWorkload {
    /// Escalating stop; safe to call on an already-dead child.
    pub async fn shutdown(&mut self, grace: Duration) -> Result<StopResult> {
        stop_gracefully(&mut self.child, grace).await
    }
}

impl WorkloadController {
    pub fn new(stop_grace: Duration) -> Self {
        Self { stop_grace }
    }

    /// Spawns the workload from a pre-rendered argument vector, recording the
    /// command line as the first line of the run log.
    pub async fn launch(&self, argv: &[String], log_path: &Path) -> Result<RunningWorkload> {
        ensure!(!argv.is_empty(), "workload argument vector is empty");

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("failed to open workload log {}", log_path.display()))?;
        writeln!(log, "$ {}", argv.join(" "))?;
        log.flush()?;

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to launch workload `{}`", argv[0]))?;

        let stdout = child.stdout.take().context("workload stdout not captured")?;
        let stderr = child.stderr.take().context("workload stderr not captured")?;
        let lines = LinesStream::new(BufReader::new(stdout).lines())
            .merge(LinesStream::new(BufReader::new(stderr).lines()));

        let pid = child.id();
        info!(?pid, "workload launched");
        Ok(RunningWorkload {
            child,
            lines: Box::new(lines),
            log,
            pid,
        })
    }

    /// Pumps output to the sink and log until the workload exits or
    /// `deadline_at` passes. The caller fixes the deadline instant when the
    /// supervised phase begins, so setup work between warm-up and this call
    /// cannot stretch the budget. Whatever happens, the child is confirmed
    /// dead before this returns.
    pub async fn supervise(
        &self,
        workload: &mut RunningWorkload,
        deadline_at: tokio::time::Instant,
        sink: &mut dyn OutputSink,
    ) -> Result<RunOutcome> {
        let outcome = loop {
            tokio::select! {
                maybe_line = workload.lines.next() => match maybe_line {
                    Some(Ok(line)) => {
                        sink.write_line(&line);
                        if let Err(e) = writeln!(workload.log, "{line}")
                            .and_then(|_| workload.log.flush())
                        {
                            warn!(error = %e, "failed to append to workload log");
                            break RunOutcome::Errored;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "workload output stream failed");
                        break RunOutcome::Errored;
                    }
                    None => {
                        let status = workload.child.wait().await?;
                        if !status.success() {
                            warn!(%status, "workload exited with non-zero status");
                        }
                        break RunOutcome::Completed {
                            exit: status.code(),
                        };
                    }
                },
                _ = tokio::time::sleep_until(deadline_at) => {
                    info!("workload deadline reached");
                    break RunOutcome::TimedOut;
                }
            }
        };

        let stopped = workload.shutdown(self.stop_grace).await?;
        debug!(?stopped, %outcome, "workload confirmed dead");
        Ok(outcome)
    }
}
