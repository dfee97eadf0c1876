//! One poll iteration: enumerate, match, terminate
//!
//! Kept free of threads and timing so the selection rules can be tested
//! against a fake actuator.

use crate::models::{ActuatorError, BoostReport, IterationReport, ProcessEntry};
use crate::process::ProcessActuator;
use crate::store::ListSnapshot;
use log::{debug, info, warn};

/// Processes whose name is blacklisted and not whitelisted, in enumeration order
pub fn select_targets(processes: &[ProcessEntry], lists: &ListSnapshot) -> Vec<ProcessEntry> {
    processes
        .iter()
        .filter(|process| lists.should_terminate(&process.name))
        .cloned()
        .collect()
}

/// Run a single enumerate-and-act pass. Never fails: vanished and protected
/// processes are counted and skipped.
pub fn run_iteration(actuator: &dyn ProcessActuator, lists: &ListSnapshot) -> IterationReport {
    let mut report = IterationReport::default();

    if lists.is_inert() {
        return report;
    }

    let processes = actuator.list_processes();
    report.inspected = processes.len();

    for target in select_targets(&processes, lists) {
        match actuator.terminate_entry(&target) {
            Ok(()) => {
                info!(
                    "Auto-terminated blacklisted process '{}' (PID: {})",
                    target.name, target.pid
                );
                report.terminated.push(target);
            }
            Err(ActuatorError::NotFound(_)) => {
                report.vanished += 1;
            }
            Err(e) => {
                debug!("Could not terminate '{}': {}", target.name, e);
                report.refused += 1;
            }
        }
    }

    report
}

/// Raise every running whitelisted process to high priority. Whitelisted
/// names are the ones the user wants to keep fast, blacklisted or not.
pub fn boost_whitelisted(actuator: &dyn ProcessActuator, lists: &ListSnapshot) -> BoostReport {
    let mut report = BoostReport::default();

    for process in actuator.list_processes() {
        if !lists.is_whitelisted(&process.name) {
            continue;
        }
        match actuator.set_high_priority(process.pid) {
            Ok(()) => {
                info!("Boosted priority for whitelisted app: {} (PID: {})", process.name, process.pid);
                report.boosted += 1;
            }
            Err(e) => {
                warn!("{}", e);
                report.errors += 1;
            }
        }
    }

    report
}
