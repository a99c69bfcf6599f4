//! Status-line macros for the harness console. Workload output passes
//! through the same terminal unprefixed, so every harness-originated line
//! carries a short colored tag to keep the two apart.

#[macro_export]
macro_rules! success_message {
    ($($arg:tt)*) => {
        println!("{} {}", "ok:".green().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "error:".red().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warning_message {
    ($($arg:tt)*) => {
        println!("{} {}", "warning:".yellow().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! info_message {
    ($($arg:tt)*) => {
        println!("{} {}", "harness:".cyan().bold(), format!($($arg)*));
    };
}

#[cfg(test)]
mod tests {
    use crate::Colorize;

    #[test]
    fn macros_accept_format_arguments() {
        crate::success_message!("run {} finished", 1);
        crate::warning_message!("device {} missing from snapshot", 2);
        crate::info_message!("artifacts in {}", "/tmp/run");
        crate::error_message!("{} devices detected, expected {}", 1, 2);
    }
}
