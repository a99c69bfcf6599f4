pub mod constants;
pub mod error;
pub mod message;
pub mod session;
pub mod types;

pub use colored::Colorize;
