//! procguard - background blacklist enforcement for running processes
//!
//! This library exposes the membership store, the process actuator seam,
//! and the monitor loop that ties them together. The `procguard` binary is
//! a thin CLI over these modules.

pub mod cli;
pub mod config;
pub mod constants;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod output;
pub mod process;
pub mod store;
