pub mod commands;
pub mod display;
pub mod interactive;
pub mod logging;
pub mod process_command;
