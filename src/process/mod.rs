//! Process inspection and control
//!
//! [`ProcessActuator`] is the seam between the monitor loop and the OS:
//! enumerate, terminate, and boost. [`SystemActuator`] implements it with
//! sysinfo; tests substitute a recording fake.

pub mod priority;

use crate::models::{ActuatorError, ProcessDetails, ProcessEntry};
use log::debug;
use std::sync::{Mutex, MutexGuard, PoisonError};
use sysinfo::{Pid, Process, ProcessStatus, ProcessesToUpdate, Signal, System};

/// OS primitives consumed by the monitor loop and the CLI
pub trait ProcessActuator: Send + Sync {
    /// Enumerate live processes. Entries that cannot be read are omitted.
    fn list_processes(&self) -> Vec<ProcessEntry>;

    /// Ask the OS to terminate `pid`
    fn terminate(&self, pid: u32) -> Result<(), ActuatorError>;

    /// Terminate an enumerated process, but only if its PID still belongs to
    /// a process with the same name. A reused PID is reported as `NotFound`.
    fn terminate_entry(&self, process: &ProcessEntry) -> Result<(), ActuatorError> {
        self.terminate(process.pid)
    }

    /// Raise `pid` to high scheduling priority
    fn set_high_priority(&self, pid: u32) -> Result<(), ActuatorError>;
}

/// sysinfo-backed actuator. The `System` cache is reused between calls.
pub struct SystemActuator {
    system: Mutex<System>,
}

impl SystemActuator {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        // A panic while refreshing leaves the cache usable; just keep going
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Processes sorted by resident memory, largest first
    pub fn top_processes(&self, limit: usize) -> Vec<ProcessDetails> {
        let mut system = self.system();

        // CPU usage is a delta between two refreshes
        system.refresh_processes(ProcessesToUpdate::All, true);
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_processes(ProcessesToUpdate::All, true);

        let mut processes: Vec<ProcessDetails> = system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessDetails {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().to_string(),
                memory_bytes: process.memory(),
                cpu_percent: process.cpu_usage(),
            })
            .filter(|p| !p.name.is_empty())
            .collect();

        sort_by_memory(&mut processes);
        processes.truncate(limit);
        processes
    }
}

impl SystemActuator {
    /// Refresh `pid` and kill it if it is still alive (and still named
    /// `expected_name`, when given)
    fn kill_live(&self, pid: u32, expected_name: Option<&str>) -> Result<(), ActuatorError> {
        let mut system = self.system();
        let sys_pid = Pid::from_u32(pid);
        system.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);

        let process = system
            .process(sys_pid)
            .filter(|process| is_live(process))
            .ok_or(ActuatorError::NotFound(pid))?;

        if let Some(expected) = expected_name {
            if process.name().to_string_lossy() != expected {
                debug!("PID {} no longer belongs to '{}'", pid, expected);
                return Err(ActuatorError::NotFound(pid));
            }
        }

        // Graceful SIGTERM where it exists, TerminateProcess on Windows
        let sent = process.kill_with(Signal::Term).unwrap_or_else(|| process.kill());
        if sent {
            debug!("Termination requested for PID {}", pid);
            Ok(())
        } else {
            Err(ActuatorError::Refused(pid))
        }
    }
}

/// Zombies keep their name until reaped but can no longer be terminated
fn is_live(process: &Process) -> bool {
    !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
}

impl Default for SystemActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessActuator for SystemActuator {
    fn list_processes(&self) -> Vec<ProcessEntry> {
        let mut system = self.system();
        system.refresh_processes(ProcessesToUpdate::All, true);

        system
            .processes()
            .iter()
            .filter(|(_, process)| is_live(process))
            .filter_map(|(pid, process)| {
                let name = process.name().to_string_lossy();
                if name.is_empty() {
                    // Kernel threads and inaccessible entries
                    return None;
                }
                Some(ProcessEntry::new(pid.as_u32(), name))
            })
            .collect()
    }

    fn terminate(&self, pid: u32) -> Result<(), ActuatorError> {
        self.kill_live(pid, None)
    }

    fn terminate_entry(&self, process: &ProcessEntry) -> Result<(), ActuatorError> {
        self.kill_live(process.pid, Some(&process.name))
    }

    fn set_high_priority(&self, pid: u32) -> Result<(), ActuatorError> {
        priority::raise(pid).map_err(|reason| ActuatorError::Priority { pid, reason })
    }
}

fn sort_by_memory(processes: &mut [ProcessDetails]) {
    processes.sort_by(|a, b| b.memory_bytes.cmp(&a.memory_bytes).then(a.pid.cmp(&b.pid)));
}
