use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use asicbench_common::error::HarnessError;
use asicbench_common::session::{RunManifest, RunSession};
use asicbench_common::types::{RunOutcome, TopologyClass};
use asicbench_counters::delta::{publish, reconcile, DeltaRecord};
use asicbench_counters::device::DeviceAccess;
use asicbench_counters::reset::reset_counters;
use asicbench_counters::snapshot::{read_counters, CounterSnapshot};
use tracing::{debug, error, info, warn};

use crate::config_manager::Config;
use crate::launch::LaunchSpec;
use crate::sidecar::{self, SidecarSpec};
use crate::sink::OutputSink;
use crate::workload::WorkloadController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Full,
    CountersOnly,
    TelemetryOnly,
    SnapshotOnly,
}

impl RunMode {
    pub fn wants_workload(&self) -> bool {
        !matches!(self, RunMode::SnapshotOnly)
    }

    pub fn wants_snapshots(&self) -> bool {
        matches!(self, RunMode::Full | RunMode::CountersOnly | RunMode::SnapshotOnly)
    }

    pub fn wants_sidecar(&self) -> bool {
        matches!(self, RunMode::Full | RunMode::TelemetryOnly)
    }
}

/// Everything a run produced, for the CLI to render.
#[derive(Debug, Default)]
pub struct HarnessReport {
    pub run_dir: Option<PathBuf>,
    pub before: Option<CounterSnapshot>,
    pub after: Option<CounterSnapshot>,
    pub delta: Option<DeltaRecord>,
    pub published_to: Option<PathBuf>,
    pub outcome: Option<RunOutcome>,
    pub interrupted: bool,
    /// The mode asked for telemetry but the sidecar never ran.
    pub sidecar_absent: bool,
}

/// Coordinates one benchmark run end to end: snapshot, workload, sidecar,
/// reconciliation, reset. Owns the only handles to both child processes.
pub struct BenchmarkHarness {
    config: Config,
    topology: TopologyClass,
    access: Box<dyn DeviceAccess>,
}

impl BenchmarkHarness {
    pub fn new(config: Config, topology: TopologyClass, access: Box<dyn DeviceAccess>) -> Self {
        Self {
            config,
            topology,
            access,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn topology(&self) -> TopologyClass {
        self.topology
    }

    /// Fatal checks that must pass before anything is launched.
    pub fn check_preconditions(&self, mode: RunMode, spec: &LaunchSpec) -> Result<()> {
        if mode.wants_workload() {
            which::which("docker")
                .map_err(|_| HarnessError::MissingDependency("docker".to_string()))?;
            which::which(&self.config.reset_utility).map_err(|_| {
                HarnessError::MissingDependency(self.config.reset_utility.clone())
            })?;
            spec.validate()?;
        }
        Ok(())
    }

    /// Runs the selected mode. `argv` is the pre-rendered container runtime
    /// argument vector (unused for snapshot-only).
    pub async fn run(
        &self,
        mode: RunMode,
        argv: &[String],
        timeout_minutes: f64,
        label: &str,
        sink: &mut dyn OutputSink,
    ) -> Result<HarnessReport> {
        let mut report = HarnessReport::default();

        if mode == RunMode::SnapshotOnly {
            report.before = Some(read_counters(self.topology, self.access.as_ref())?);
            return Ok(report);
        }

        // Pre-run snapshot failures abort the whole run; nothing has been
        // launched yet.
        if mode.wants_snapshots() {
            report.before = Some(read_counters(self.topology, self.access.as_ref())?);
        }

        let session = RunSession::create(&self.config.base_output_dir, label)?;
        session.write_manifest(&RunManifest {
            run_id: session.run_id().to_string(),
            label: session.label().to_string(),
            start_time: session.started_at().to_rfc3339(),
            topology: Some(self.topology.to_string()),
            timeout_minutes: Some(timeout_minutes),
            warm_up_seconds: self.config.warm_up_seconds,
            command: Some(argv.join(" ")),
        })?;
        info!(run_dir = %session.dir().display(), run_id = session.run_id(), "run session created");
        report.run_dir = Some(session.dir().to_path_buf());

        // A failed phase still owes the post-run duties below.
        if let Err(e) = self
            .workload_phase(mode, argv, timeout_minutes, &session, &mut report, sink)
            .await
        {
            warn!(error = %e, "workload phase failed");
            report.outcome = Some(RunOutcome::Errored);
        }

        // The after-snapshot is best-effort: the run already happened, so a
        // failed read only costs the delta report.
        if mode.wants_snapshots() && report.before.is_some() {
            match read_counters(self.topology, self.access.as_ref()) {
                Ok(snapshot) => report.after = Some(snapshot),
                Err(e) => warn!(error = %e, "post-run snapshot failed; skipping delta report"),
            }
        }

        if let (Some(before), Some(after)) = (report.before.as_ref(), report.after.as_ref()) {
            let record = reconcile(before, after);
            match self.publish_delta(&record, &session) {
                Ok(target) => report.published_to = Some(target),
                Err(e) => warn!(error = %e, "failed to publish delta record"),
            }
            report.delta = Some(record);
        }

        // Counter reset happens exactly once, last, regardless of outcome.
        if let Err(e) = reset_counters(&self.config.reset_utility).await {
            error!(error = %e, "counter reset failed");
        }

        Ok(report)
    }

    async fn workload_phase(
        &self,
        mode: RunMode,
        argv: &[String],
        timeout_minutes: f64,
        session: &RunSession,
        report: &mut HarnessReport,
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        let controller = WorkloadController::new(self.config.stop_grace());
        let mut workload = controller.launch(argv, &session.workload_log()).await?;

        info!(secs = self.config.warm_up_seconds, "waiting for workload warm-up");
        tokio::select! {
            _ = tokio::time::sleep(self.config.warm_up()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received during warm-up");
                report.interrupted = true;
            }
        }

        // The supervised budget starts here; the sidecar's confirmation
        // window overlaps it rather than extending it.
        let deadline_at = tokio::time::Instant::now()
            + deadline_for(timeout_minutes, self.config.warm_up_seconds);

        let mut sidecar = None;
        if !report.interrupted && mode.wants_sidecar() {
            match sidecar::start(&self.sidecar_spec(session)).await {
                Ok(handle) => sidecar = handle,
                Err(e) => {
                    warn!(error = %e, "telemetry sidecar failed to start; continuing without telemetry")
                }
            }
            report.sidecar_absent = sidecar.is_none();
        }

        if !report.interrupted {
            tokio::select! {
                res = controller.supervise(&mut workload, deadline_at, sink) => match res {
                    Ok(outcome) => report.outcome = Some(outcome),
                    Err(e) => {
                        warn!(error = %e, "workload supervision failed");
                        report.outcome = Some(RunOutcome::Errored);
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, tearing down");
                    report.interrupted = true;
                }
            }
        }

        // Teardown order: workload first, then sidecar, so telemetry covers
        // as much of the workload's lifetime as possible.
        let stopped = workload.shutdown(self.config.stop_grace()).await?;
        debug!(?stopped, "workload teardown complete");
        if let Some(handle) = sidecar {
            match handle.stop(self.config.sidecar_grace()).await {
                Ok(result) => debug!(?result, "sidecar stopped"),
                Err(e) => warn!(error = %e, "failed to stop sidecar cleanly"),
            }
        }

        Ok(())
    }

    /// Prefers a telemetry file the sidecar actually produced, falling back
    /// to the workload log.
    fn publish_delta(&self, record: &DeltaRecord, session: &RunSession) -> Result<PathBuf> {
        let target = (0..self.topology.expected_devices())
            .map(|device| session.telemetry_file(device))
            .find(|path| path.is_file())
            .unwrap_or_else(|| session.workload_log());
        publish(record, &target)?;
        Ok(target)
    }

    fn sidecar_spec(&self, session: &RunSession) -> SidecarSpec {
        let count = self.topology.expected_devices();
        SidecarSpec {
            executable: PathBuf::from(&self.config.sidecar_executable),
            sample_period_ms: self.config.sidecar_sample_period_ms,
            device_ids: (0..count).collect(),
            output_paths: (0..count).map(|device| session.telemetry_file(device)).collect(),
            log_path: session.sidecar_log(),
            confirm_window: self.config.sidecar_confirm_window(),
        }
    }
}

/// The deadline excludes warm-up: `timeout*60 - warm_up` seconds of
/// supervised run time.
fn deadline_for(timeout_minutes: f64, warm_up_seconds: u64) -> Duration {
    let secs = timeout_minutes * 60.0 - warm_up_seconds as f64;
    Duration::from_secs_f64(secs.max(0.0))
}
