use std::time::Duration;

use asicbench_client::sink::MemorySink;
use asicbench_client::workload::WorkloadController;
use asicbench_common::types::RunOutcome;
use tempfile::TempDir;
use tokio::time::Instant;

fn argv(script: &str) -> Vec<String> {
    vec!["sh".into(), "-c".into(), script.into()]
}

fn deadline_in(duration: Duration) -> Instant {
    Instant::now() + duration
}

#[tokio::test]
async fn completed_workload_preserves_line_order() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("docker_output.log");
    let controller = WorkloadController::new(Duration::from_secs(2));
    let mut sink = MemorySink::default();

    let mut workload = controller
        .launch(&argv("echo one; echo two; echo three"), &log_path)
        .await
        .unwrap();
    let outcome = controller
        .supervise(&mut workload, deadline_in(Duration::from_secs(10)), &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed { exit: Some(0) });
    assert_eq!(sink.lines, vec!["one", "two", "three"]);

    let log = std::fs::read_to_string(&log_path).unwrap();
    let mut lines = log.lines();
    assert!(lines.next().unwrap().starts_with("$ sh -c"));
    assert_eq!(lines.collect::<Vec<_>>(), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn non_zero_exit_is_completed_not_a_harness_failure() {
    let dir = TempDir::new().unwrap();
    let controller = WorkloadController::new(Duration::from_secs(2));
    let mut sink = MemorySink::default();

    let mut workload = controller
        .launch(
            &argv("echo oom-killed >&2; exit 3"),
            &dir.path().join("docker_output.log"),
        )
        .await
        .unwrap();
    let outcome = controller
        .supervise(&mut workload, deadline_in(Duration::from_secs(10)), &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed { exit: Some(3) });
    // stderr is part of the combined stream
    assert!(sink.lines.iter().any(|l| l.contains("oom-killed")));
}

#[tokio::test]
async fn never_ending_workload_times_out_and_is_confirmed_dead() {
    let dir = TempDir::new().unwrap();
    let controller = WorkloadController::new(Duration::from_secs(2));
    let mut sink = MemorySink::default();

    let mut workload = controller
        .launch(
            &argv("while :; do echo tick; sleep 0.1; done"),
            &dir.path().join("docker_output.log"),
        )
        .await
        .unwrap();
    let pid = workload.pid.expect("workload has a pid") as libc::pid_t;

    let started = std::time::Instant::now();
    let outcome = controller
        .supervise(&mut workload, deadline_in(Duration::from_millis(600)), &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::TimedOut);
    assert!(started.elapsed() >= Duration::from_millis(600));
    // reaped: signalling pid 0 must fail with ESRCH
    let alive = unsafe { libc::kill(pid, 0) };
    assert_eq!(alive, -1);
    assert!(!sink.lines.is_empty());
}

#[tokio::test]
async fn empty_argv_is_rejected_before_spawn() {
    let dir = TempDir::new().unwrap();
    let controller = WorkloadController::new(Duration::from_secs(1));
    let result = controller
        .launch(&[], &dir.path().join("docker_output.log"))
        .await;
    assert!(result.is_err());
}
