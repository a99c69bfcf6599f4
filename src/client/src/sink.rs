/// Operator-visible destination for workload output lines. The controller
/// takes a sink rather than printing directly so tests can capture the
/// stream in memory.
pub trait OutputSink: Send {
    fn write_line(&mut self, line: &str);
}

/// Echoes lines to the operator's console.
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl OutputSink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}
