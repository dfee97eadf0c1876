//! Output formatting module
//!
//! Handles:
//! - Termination events for the monitor (human text or single-line JSON)
//! - Rendering of the membership lists
//! - The top-processes table

use anyhow::Result;
use crate::config::Settings;
use crate::constants::EVENT_PROCESS_TERMINATED;
use crate::models::{ListKind, ProcessDetails, ProcessEntry, TerminationEvent};
use crate::store::MembershipStore;
use std::path::Path;

/// Create a TerminationEvent for a process the monitor just terminated.
/// This is the canonical way to build an event for output.
pub fn create_termination_event(process: &ProcessEntry) -> TerminationEvent {
    TerminationEvent {
        timestamp: chrono::Local::now().to_rfc3339(),
        event_type: EVENT_PROCESS_TERMINATED.to_string(),
        pid: process.pid,
        name: process.name.clone(),
    }
}

/// Format a termination event as human-readable text
pub fn format_event_human(event: &TerminationEvent) -> String {
    format!(
        "[{}] Terminated blacklisted process: {} (PID: {})",
        event.timestamp, event.name, event.pid
    )
}

/// Format a termination event as a JSON string
pub fn format_event_json(event: &TerminationEvent) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

/// Both lists as a JSON document with the same shape as the lists file
pub fn format_lists_json(store: &MembershipStore) -> Result<String> {
    let value = serde_json::json!({
        "path": store.path().display().to_string(),
        "blacklist": store.list(ListKind::Blacklist).iter().collect::<Vec<_>>(),
        "whitelist": store.list(ListKind::Whitelist).iter().collect::<Vec<_>>(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn format_lists_human(store: &MembershipStore) -> String {
    let mut out = String::new();
    for kind in [ListKind::Blacklist, ListKind::Whitelist] {
        let list = store.list(kind);
        out.push_str(&format!("{} ({}):\n", capitalize(kind.as_str()), list.len()));
        if list.is_empty() {
            out.push_str("  (empty)\n");
        }
        for name in list.iter() {
            out.push_str(&format!("  {}\n", name));
        }
    }
    out
}

/// Effective settings: the file they came from plus the resolved lists path
pub fn format_settings_human(path: &Path, settings: &Settings, lists_path: &Path) -> String {
    format!(
        "Settings file: {}\nPoll interval: {:.1}s\nLists file: {}\n",
        path.display(),
        settings.monitor.poll_interval,
        lists_path.display()
    )
}

pub fn format_settings_json(path: &Path, settings: &Settings, lists_path: &Path) -> Result<String> {
    let value = serde_json::json!({
        "path": path.display().to_string(),
        "poll_interval": settings.monitor.poll_interval,
        "lists_path": lists_path.display().to_string(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn format_processes_human(processes: &[ProcessDetails]) -> String {
    let mut out = format!("{:>8}  {:>10}  {:>6}  {}\n", "PID", "MEMORY", "CPU%", "NAME");
    for p in processes {
        out.push_str(&format!(
            "{:>8}  {:>10}  {:>6.1}  {}\n",
            p.pid,
            format_bytes(p.memory_bytes),
            p.cpu_percent,
            p.name
        ));
    }
    out
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
