pub mod delta;
pub mod device;
pub mod reset;
pub mod snapshot;
