/// Fixed, ordered set of throttler counters exposed by the ARC firmware.
/// Delta headers and telemetry columns follow this ordering everywhere.
pub const THROTTLER_NAMES: [&str; NUM_THROTTLERS] = [
    "Fmax",
    "TDP",
    "FastTDC",
    "TDC",
    "Thm",
    "BoardPower",
    "Voltage",
    "GDDRThm",
];

pub const NUM_THROTTLERS: usize = 8;

/// Scratch RAM window of the reset unit, as mapped through the AXI bus.
pub const RESET_UNIT_SCRATCH_RAM_BASE_ADDR: u32 = 0x8003_0400;

/// Throttler counts live 22 words into the scratch RAM, one 32-bit word each.
pub const THROTTLER_COUNT_BASE_REG_ADDR: u32 = RESET_UNIT_SCRATCH_RAM_BASE_ADDR + 4 * 22;

pub const WORKLOAD_LOG_FILE: &str = "docker_output.log";
pub const SIDECAR_LOG_FILE: &str = "sidecar.log";
pub const RUN_MANIFEST_FILE: &str = "run.json";
pub const HARNESS_LOG_FILE: &str = "harness.log";

/// Delay between workload launch and sidecar start; the deadline clock also
/// starts after this delay.
pub const DEFAULT_WARM_UP_SECS: u64 = 10;
pub const DEFAULT_STOP_GRACE_SECS: u64 = 10;
pub const DEFAULT_SIDECAR_GRACE_SECS: u64 = 10;
pub const DEFAULT_SIDECAR_CONFIRM_WINDOW_SECS: u64 = 2;
pub const DEFAULT_SIDECAR_SAMPLE_PERIOD_MS: u64 = 1000;

pub const DEFAULT_RESET_UTILITY: &str = "tt-smi";
pub const DEFAULT_SIDECAR_EXECUTABLE: &str = "tt-sampler";
pub const DEFAULT_DEVICE_ROOT: &str = "/dev/tenstorrent";
