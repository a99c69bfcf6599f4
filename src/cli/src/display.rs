use asicbench_common::constants::THROTTLER_NAMES;
use asicbench_common::{warning_message, Colorize};
use asicbench_counters::delta::DeltaRecord;
use asicbench_counters::snapshot::CounterSnapshot;

const NAME_WIDTH: usize = 10;
const VALUE_WIDTH: usize = 12;

fn header_row() -> String {
    THROTTLER_NAMES
        .iter()
        .map(|name| format!("{name:>VALUE_WIDTH$}"))
        .collect()
}

/// One row per device, one fixed-width column per throttler counter.
pub fn print_snapshot(title: &str, snapshot: &CounterSnapshot) {
    println!();
    println!("{}", title.bold());
    println!("{:<NAME_WIDTH$}{}", "device", header_row());
    for (device, counts) in &snapshot.counts {
        let row: String = counts
            .iter()
            .map(|value| format!("{value:>VALUE_WIDTH$}"))
            .collect();
        println!("{:<NAME_WIDTH$}{row}", format!("ASIC_{device}"));
    }
}

pub fn print_delta(record: &DeltaRecord) {
    println!();
    println!("{}", "Throttler deltas (after - before)".bold());
    println!("{:<NAME_WIDTH$}{}", "device", header_row());
    for (device, deltas) in &record.deltas {
        let row: String = deltas
            .iter()
            .map(|delta| format!("{delta:>VALUE_WIDTH$}"))
            .collect();
        println!("{:<NAME_WIDTH$}{row}", format!("ASIC_{device}"));
    }
    for device in &record.missing {
        warning_message!(
            "ASIC_{} appeared in only one snapshot; no delta computed",
            device
        );
    }
}
