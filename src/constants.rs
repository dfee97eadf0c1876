//! Global constants for procguard
//!
//! Centralized location for application-wide constants

use std::time::Duration;

/// Application name, used for config/data directory names and the CLI
pub const APP_NAME: &str = "procguard";

/// Environment variable holding the log filter (EnvFilter syntax)
pub const LOG_ENV_VAR: &str = "PROCGUARD_LOG";

/// Settings file name inside the config directory
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Blacklist/whitelist file name inside the data directory
pub const LISTS_FILE_NAME: &str = "process_config.json";

/// Delay between two monitor iterations unless configured otherwise
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Polling interval bounds in seconds (settings and `--interval`)
pub const POLL_INTERVAL_MIN: f64 = 0.1;
pub const POLL_INTERVAL_MAX: f64 = 300.0;

/// Default number of rows shown by `procguard processes`
pub const DEFAULT_TOP_PROCESSES: usize = 10;

/// Nice value applied when boosting a process on Unix
pub const UNIX_BOOST_NICE: i32 = -10;

/// Event type identifiers for structured output
pub const EVENT_PROCESS_TERMINATED: &str = "process_terminated";
