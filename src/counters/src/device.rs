use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use anyhow::{Context, Result};

const PAGE_SIZE: usize = 4096;

/// A single attached accelerator. Counter reads are atomic word-sized
/// accesses; the harness never writes through this interface.
pub trait Device: Send {
    fn index(&self) -> usize;
    fn read_word(&self, addr: u32) -> io::Result<u32>;
}

/// Boundary to the hardware-access collaborator. Queried once before a run to
/// validate topology, then once per snapshot.
pub trait DeviceAccess: Send + Sync {
    fn detect_devices(&self) -> Result<Vec<Box<dyn Device>>>;
}

/// Production access path: one character device per ASIC under
/// `/dev/tenstorrent/<n>`, with the ARC scratch window reachable by mapping
/// the device at the counter's AXI offset.
pub struct TenstorrentAccess {
    dev_root: PathBuf,
}

impl TenstorrentAccess {
    pub fn new(dev_root: impl Into<PathBuf>) -> Self {
        Self {
            dev_root: dev_root.into(),
        }
    }
}

impl Default for TenstorrentAccess {
    fn default() -> Self {
        Self::new(asicbench_common::constants::DEFAULT_DEVICE_ROOT)
    }
}

impl DeviceAccess for TenstorrentAccess {
    fn detect_devices(&self) -> Result<Vec<Box<dyn Device>>> {
        let entries = std::fs::read_dir(&self.dev_root).with_context(|| {
            format!(
                "failed to enumerate devices under {}",
                self.dev_root.display()
            )
        })?;

        let mut indices: Vec<usize> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_string_lossy().parse::<usize>().ok())
            .collect();
        indices.sort_unstable();

        Ok(indices
            .into_iter()
            .map(|index| {
                Box::new(TenstorrentDevice {
                    index,
                    path: self.dev_root.join(index.to_string()),
                }) as Box<dyn Device>
            })
            .collect())
    }
}

struct TenstorrentDevice {
    index: usize,
    path: PathBuf,
}

impl Device for TenstorrentDevice {
    fn index(&self) -> usize {
        self.index
    }

    fn read_word(&self, addr: u32) -> io::Result<u32> {
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let aligned = addr as usize & !(PAGE_SIZE - 1);
        let offset = addr as usize - aligned;

        // Map a single page around the target word. The driver exposes the
        // scratch RAM uncached, so a volatile load is a coherent read.
        unsafe {
            let mapping = libc::mmap(
                std::ptr::null_mut(),
                PAGE_SIZE,
                libc::PROT_READ,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned as libc::off_t,
            );
            if mapping == libc::MAP_FAILED {
                return Err(io::Error::last_os_error());
            }
            let value = std::ptr::read_volatile(mapping.add(offset) as *const u32);
            libc::munmap(mapping, PAGE_SIZE);
            Ok(value)
        }
    }
}

/// In-memory stand-ins for the hardware boundary, shared by the test suites
/// of the crates that consume it.
pub mod fixture {
    use super::{Device, DeviceAccess};
    use anyhow::Result;
    use asicbench_common::constants::THROTTLER_COUNT_BASE_REG_ADDR;
    use std::io;

    #[derive(Debug, Clone)]
    pub struct FixtureDevice {
        pub index: usize,
        pub counters: Vec<u32>,
        /// Counter slot whose read should fail, if any.
        pub fail_at: Option<usize>,
    }

    impl FixtureDevice {
        pub fn new(index: usize, counters: Vec<u32>) -> Self {
            Self {
                index,
                counters,
                fail_at: None,
            }
        }
    }

    impl Device for FixtureDevice {
        fn index(&self) -> usize {
            self.index
        }

        fn read_word(&self, addr: u32) -> io::Result<u32> {
            let slot = (addr.saturating_sub(THROTTLER_COUNT_BASE_REG_ADDR) / 4) as usize;
            if self.fail_at == Some(slot) {
                return Err(io::Error::new(io::ErrorKind::Other, "simulated read fault"));
            }
            self.counters.get(slot).copied().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "address outside counter window")
            })
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct FixtureAccess {
        pub devices: Vec<FixtureDevice>,
    }

    impl FixtureAccess {
        /// `count` devices, every counter preloaded with the same values.
        pub fn uniform(count: usize, counters: Vec<u32>) -> Self {
            Self {
                devices: (0..count)
                    .map(|index| FixtureDevice::new(index, counters.clone()))
                    .collect(),
            }
        }
    }

    impl DeviceAccess for FixtureAccess {
        fn detect_devices(&self) -> Result<Vec<Box<dyn Device>>> {
            Ok(self
                .devices
                .iter()
                .cloned()
                .map(|device| Box::new(device) as Box<dyn Device>)
                .collect())
        }
    }
}
