pub mod config_manager;
pub mod harness;
pub mod launch;
pub mod lifecycle;
pub mod sidecar;
pub mod sink;
pub mod workload;

pub use harness::BenchmarkHarness;
