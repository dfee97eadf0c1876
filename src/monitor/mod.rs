pub mod core;
pub mod polling;

pub use self::core::{boost_whitelisted, run_iteration, select_targets};
pub use polling::{run_until, ProcessMonitor};
