use console::Emoji;
use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use asicbench_common::types::TopologyClass;

use crate::commands::RunArgs;

const DEFAULT_TIMEOUT_MINUTES: f64 = 5.0;

/// Run arguments with every gap filled in, ready for the harness.
#[derive(Debug, Clone)]
pub struct FinalizedRunArgs {
    pub command: String,
    pub topology: TopologyClass,
    pub timeout_minutes: f64,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct InteractiveRunArgs {
    pub command: Option<String>,
    pub topology: TopologyClass,
    pub timeout: Option<f64>,
    pub label: String,
}

impl InteractiveRunArgs {
    pub fn from_partial(cli_args: RunArgs) -> Self {
        Self {
            command: cli_args.command,
            topology: cli_args.topology,
            // a non-positive timeout is treated as "not given", matching the
            // flag's absence
            timeout: cli_args.timeout.filter(|t| *t > 0.0),
            label: cli_args.label,
        }
    }

    pub fn prompt_missing(mut self) -> Self {
        let arrow = Emoji("👉 ", "> ").to_string();
        let theme = ColorfulTheme {
            prompt_prefix: Style::new().green().apply_to(arrow),
            prompt_suffix: Style::new().dim().apply_to(":".to_string()),
            success_prefix: Style::new().green().apply_to("✔".to_string()),
            success_suffix: Style::new().dim().apply_to("".to_string()),
            values_style: Style::new().yellow(),
            active_item_style: Style::new().cyan().bold(),
            ..ColorfulTheme::default()
        };

        if self.command.is_none() {
            self.command = Some(
                Input::with_theme(&theme)
                    .with_prompt("Enter the benchmark command to run in the container")
                    .interact_text()
                    .unwrap(),
            );
        }

        if self.timeout.is_none() {
            self.timeout = Some(
                Input::with_theme(&theme)
                    .with_prompt("Timeout per run in minutes")
                    .default(DEFAULT_TIMEOUT_MINUTES)
                    .interact_text()
                    .unwrap(),
            );
        }

        self
    }

    pub fn into_finalized(self) -> FinalizedRunArgs {
        FinalizedRunArgs {
            command: self.command.expect("command must be set"),
            topology: self.topology,
            timeout_minutes: self.timeout.unwrap_or(DEFAULT_TIMEOUT_MINUTES),
            label: self.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_counts_as_missing() {
        let args = InteractiveRunArgs::from_partial(RunArgs {
            command: Some("pytest demo.py".into()),
            timeout: Some(0.0),
            ..Default::default()
        });
        assert!(args.timeout.is_none());
    }

    #[test]
    fn complete_args_finalize_without_prompting() {
        let finalized = InteractiveRunArgs::from_partial(RunArgs {
            command: Some("pytest demo.py".into()),
            topology: TopologyClass::P300,
            timeout: Some(2.5),
            label: "nightly".into(),
        })
        .into_finalized();

        assert_eq!(finalized.command, "pytest demo.py");
        assert_eq!(finalized.timeout_minutes, 2.5);
        assert_eq!(finalized.label, "nightly");
    }
}
