use std::collections::BTreeMap;

use anyhow::Result;
use asicbench_common::constants::{NUM_THROTTLERS, THROTTLER_COUNT_BASE_REG_ADDR};
use asicbench_common::error::HarnessError;
use asicbench_common::types::TopologyClass;
use tracing::debug;

use crate::device::DeviceAccess;

/// Point-in-time read of every throttler counter across all devices. Device
/// indices are dense and stable for the run; counts are stored in the fixed
/// `THROTTLER_NAMES` ordering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub counts: BTreeMap<usize, Vec<u64>>,
}

impl CounterSnapshot {
    pub fn device_count(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, device: usize) -> Option<&[u64]> {
        self.counts.get(&device).map(Vec::as_slice)
    }
}

/// Reads all counters for the given topology. The detected device count must
/// match the class exactly; a partially attached fleet must not produce a
/// short snapshot.
pub fn read_counters(
    class: TopologyClass,
    access: &dyn DeviceAccess,
) -> Result<CounterSnapshot> {
    let devices = access.detect_devices()?;
    let expected = class.expected_devices();
    if devices.len() != expected {
        return Err(HarnessError::TopologyMismatch {
            class: class.to_string(),
            expected,
            detected: devices.len(),
        }
        .into());
    }

    let mut snapshot = CounterSnapshot::default();
    for device in &devices {
        let mut counts = Vec::with_capacity(NUM_THROTTLERS);
        for slot in 0..NUM_THROTTLERS {
            let addr = THROTTLER_COUNT_BASE_REG_ADDR + (slot as u32) * 4;
            let value = device.read_word(addr).map_err(|source| HarnessError::DeviceRead {
                device: device.index(),
                counter: asicbench_common::constants::THROTTLER_NAMES[slot],
                source,
            })?;
            counts.push(u64::from(value));
        }
        snapshot.counts.insert(device.index(), counts);
    }

    debug!(devices = snapshot.device_count(), "captured counter snapshot");
    Ok(snapshot)
}
