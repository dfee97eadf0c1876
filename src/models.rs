//! Data models module
//!
//! Defines core data structures:
//! - ProcessEntry / ProcessDetails: what the OS reports about a live process
//! - ListKind: which membership list an operation targets
//! - IterationReport / MonitorStats: what the monitor loop did
//! - TerminationEvent: canonical structured output for a termination
//! - Error enums for the store, the actuator and the settings file

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A live process as seen by one enumeration pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessEntry {
    /// Process ID (PID)
    pub pid: u32,
    /// Process name as reported by the OS (e.g. `bad.exe`)
    pub name: String,
}

impl ProcessEntry {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }
}

/// Resource usage of a process, used by the `processes` listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDetails {
    pub pid: u32,
    pub name: String,
    /// Resident memory in bytes
    pub memory_bytes: u64,
    /// CPU usage since the previous refresh, in percent of one core
    pub cpu_percent: f32,
}

/// The two membership lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Blacklist,
    Whitelist,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Blacklist => "blacklist",
            ListKind::Whitelist => "whitelist",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blacklist" => Ok(ListKind::Blacklist),
            "whitelist" => Ok(ListKind::Whitelist),
            other => Err(format!("unknown list '{}', expected blacklist or whitelist", other)),
        }
    }
}

/// Result of `ProcessMonitor::start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Result of `ProcessMonitor::stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    StopRequested,
    NotRunning,
}

/// What one poll iteration did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    /// Number of processes enumerated
    pub inspected: usize,
    /// Processes a termination was successfully requested for
    pub terminated: Vec<ProcessEntry>,
    /// Matches that exited before they could be terminated
    pub vanished: usize,
    /// Matches the OS refused to terminate (access denied, protected)
    pub refused: usize,
}

/// Outcome of raising every running whitelisted process to high priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostReport {
    pub boosted: usize,
    pub errors: usize,
}

/// Counters accumulated across every iteration of a `ProcessMonitor`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStats {
    /// Number of loop threads spawned
    pub runs: u64,
    pub iterations: u64,
    pub terminated: u64,
    pub vanished: u64,
    pub refused: u64,
    /// Iterations that panicked and were skipped
    pub panics: u64,
}

/// Canonical event structure for termination output.
/// Used by the monitor command for both human and JSON rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationEvent {
    /// RFC 3339 timestamp of the termination request
    pub timestamp: String,
    /// Event type identifier
    pub event_type: String,
    pub pid: u32,
    pub name: String,
}

/// Errors raised while loading or persisting the membership lists
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read process lists from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Process lists file {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write process lists to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize process lists: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Process name must not be empty")]
    EmptyName,
}

/// Errors raised by a process actuator. None of these are fatal to the monitor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActuatorError {
    #[error("No process with PID {0}")]
    NotFound(u32),

    #[error("Termination of PID {0} was refused")]
    Refused(u32),

    #[error("Failed to change priority of PID {pid}: {reason}")]
    Priority { pid: u32, reason: String },
}

/// Errors raised by the settings file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Note: bounds must match POLL_INTERVAL_MIN/MAX in constants.rs
    #[error("Invalid polling interval: {0}. Must be between 0.1 and 300.0 seconds")]
    InvalidInterval(f64),

    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is invalid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No {0} directory available on this platform")]
    NoDirectory(&'static str),
}
