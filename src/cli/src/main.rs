use asicbench_cli::process_command::process_cli;
use asicbench_common::Colorize;

#[tokio::main]
pub async fn main() {
    match process_cli().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            asicbench_common::error_message!("{e:#}");
            std::process::exit(1);
        }
    }
}
