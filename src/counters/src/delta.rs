use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use asicbench_common::error::HarnessError;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::snapshot::CounterSnapshot;

/// Signed per-device, per-counter differences between an "after" and a
/// "before" snapshot. Negative deltas (wrapped or externally reset counters)
/// are accepted as-is. Devices present in only one snapshot are flagged in
/// `missing` and excluded from the numeric deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaRecord {
    pub deltas: BTreeMap<usize, Vec<i64>>,
    pub missing: Vec<usize>,
}

impl DeltaRecord {
    /// One header line per device: `{ASIC_<idx>}:{v0,v1,...,vK}` in the
    /// fixed counter ordering.
    pub fn header_lines(&self) -> Vec<String> {
        self.deltas
            .iter()
            .map(|(device, values)| {
                let joined = values
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{{ASIC_{device}}}:{{{joined}}}")
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

pub fn reconcile(before: &CounterSnapshot, after: &CounterSnapshot) -> DeltaRecord {
    let mut record = DeltaRecord::default();

    for (device, before_counts) in &before.counts {
        match after.counts.get(device) {
            Some(after_counts) => {
                let deltas = after_counts
                    .iter()
                    .zip(before_counts.iter())
                    .map(|(a, b)| *a as i64 - *b as i64)
                    .collect();
                record.deltas.insert(*device, deltas);
            }
            None => record.missing.push(*device),
        }
    }
    for device in after.counts.keys() {
        if !before.counts.contains_key(device) {
            record.missing.push(*device);
        }
    }
    record.missing.sort_unstable();

    if !record.missing.is_empty() {
        warn!(
            devices = ?record.missing,
            "devices missing from one snapshot; reported as corrupted and excluded from deltas"
        );
    }
    record
}

/// Prepends the delta header lines to `target`. The rewrite goes through a
/// sibling temp file and an atomic rename, so a failure leaves the original
/// artifact intact rather than half-overwritten.
pub fn publish(record: &DeltaRecord, target: &Path) -> Result<()> {
    if !target.is_file() {
        return Err(HarnessError::NoArtifactTarget.into());
    }

    let original = fs::read(target)
        .with_context(|| format!("failed to read artifact {}", target.display()))?;
    let dir = target
        .parent()
        .ok_or(HarnessError::NoArtifactTarget)?;

    let mut staged = NamedTempFile::new_in(dir).context("failed to stage artifact rewrite")?;
    for line in record.header_lines() {
        writeln!(staged, "{line}")?;
    }
    staged.write_all(&original)?;
    staged.flush()?;
    staged
        .persist(target)
        .with_context(|| format!("failed to replace artifact {}", target.display()))?;

    info!(target = %target.display(), devices = record.deltas.len(), "published delta record");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(usize, &[u64])]) -> CounterSnapshot {
        let mut snap = CounterSnapshot::default();
        for (device, counts) in entries {
            snap.counts.insert(*device, counts.to_vec());
        }
        snap
    }

    #[test]
    fn computes_signed_deltas_per_counter() {
        let before = snapshot(&[(0, &[10, 20])]);
        let after = snapshot(&[(0, &[15, 20])]);

        let record = reconcile(&before, &after);
        assert_eq!(record.deltas[&0], vec![5, 0]);
        assert_eq!(record.header_lines(), vec!["{ASIC_0}:{5,0}"]);
        assert!(record.missing.is_empty());
    }

    #[test]
    fn wrapped_counters_produce_negative_deltas() {
        let before = snapshot(&[(0, &[100, 7])]);
        let after = snapshot(&[(0, &[40, 7])]);

        let record = reconcile(&before, &after);
        assert_eq!(record.deltas[&0], vec![-60, 0]);
        assert_eq!(record.header_lines(), vec!["{ASIC_0}:{-60,0}"]);
    }

    #[test]
    fn one_sided_devices_are_flagged_not_dropped_silently() {
        let before = snapshot(&[(0, &[1, 1]), (1, &[2, 2])]);
        let after = snapshot(&[(0, &[2, 1]), (2, &[9, 9])]);

        let record = reconcile(&before, &after);
        assert_eq!(record.deltas.len(), 1);
        assert_eq!(record.deltas[&0], vec![1, 0]);
        assert_eq!(record.missing, vec![1, 2]);
    }

    #[test]
    fn publish_prepends_headers_to_existing_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("docker_output.log");
        fs::write(&target, "line one\nline two\n").unwrap();

        let record = reconcile(
            &snapshot(&[(0, &[10, 20]), (1, &[0, 0])]),
            &snapshot(&[(0, &[15, 20]), (1, &[3, 4])]),
        );
        publish(&record, &target).unwrap();

        let content = fs::read_to_string(&target).unwrap();
        assert_eq!(
            content,
            "{ASIC_0}:{5,0}\n{ASIC_1}:{3,4}\nline one\nline two\n"
        );
    }

    #[test]
    fn publish_without_target_fails_explicitly() {
        let dir = tempfile::TempDir::new().unwrap();
        let record = DeltaRecord::default();

        let err = publish(&record, &dir.path().join("nope.log")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::NoArtifactTarget)
        ));
    }
}
