#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use crossbeam::channel;
use log::{debug, warn};
use procguard::cli::{self, CliArgs, CliCommand, GlobalOptions, ListAction, SettingsAction};
use procguard::config::Settings;
use procguard::logging::{self, Verbosity};
use procguard::models::{MonitorStats, TerminationEvent};
use procguard::monitor::{self, ProcessMonitor};
use procguard::output;
use procguard::process::{ProcessActuator, SystemActuator};
use procguard::store::MembershipStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    let args = cli::parse_args()?;

    // A second subscriber (e.g. in tests) is not worth failing over
    let _ = logging::init(Verbosity::from_flags(args.global.quiet, args.global.verbose));

    let settings = load_settings(&args)?;
    let lists_path = resolve_lists_path(&args, &settings)?;

    match args.command {
        CliCommand::Lists { json } => {
            let store = open_store(lists_path);
            if json {
                println!("{}", output::format_lists_json(&store)?);
            } else {
                print!("{}", output::format_lists_human(&store));
            }
        }
        CliCommand::EditList { kind, action, name } => {
            let mut store = open_store(lists_path);
            let name = name.trim();
            match action {
                ListAction::Add => {
                    let added = store
                        .add(kind, name)
                        .with_context(|| format!("Could not add '{}' to the {}", name, kind))?;
                    if added {
                        println!("Added '{}' to the {}", name, kind);
                    } else {
                        println!("'{}' is already present in the {}", name, kind);
                    }
                }
                ListAction::Remove => {
                    let removed = store
                        .remove(kind, name)
                        .with_context(|| format!("Could not remove '{}' from the {}", name, kind))?;
                    if removed {
                        println!("Removed '{}' from the {}", name, kind);
                    } else {
                        println!("'{}' is not present in the {}", name, kind);
                    }
                }
            }
        }
        CliCommand::Monitor { interval, json, once } => {
            let interval = interval.unwrap_or_else(|| settings.polling_duration());
            run_monitor(lists_path, interval, json, once)?;
        }
        CliCommand::Processes { limit, json } => {
            let processes = SystemActuator::new().top_processes(limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&processes)?);
            } else {
                print!("{}", output::format_processes_human(&processes));
            }
        }
        CliCommand::Kill { pid } => {
            SystemActuator::new()
                .terminate(pid)
                .with_context(|| format!("Failed to terminate PID {}", pid))?;
            println!("Terminated PID {}", pid);
        }
        CliCommand::Boost { pid } => {
            SystemActuator::new()
                .set_high_priority(pid)
                .with_context(|| format!("Failed to boost PID {}", pid))?;
            println!("Raised PID {} to high priority", pid);
        }
        CliCommand::Settings { action } => {
            let settings_path = settings_path(&args.global)?;
            edit_settings(settings, &settings_path, &lists_path, action)?;
        }
        CliCommand::BoostWhitelisted => {
            let store = open_store(lists_path);
            let report = monitor::boost_whitelisted(&SystemActuator::new(), &store.snapshot());
            println!(
                "Boosted {} whitelisted process(es), {} error(s)",
                report.boosted, report.errors
            );
        }
    }

    Ok(())
}

fn load_settings(args: &CliArgs) -> Result<Settings> {
    match &args.global.config_path {
        // `settings` may be creating the file
        Some(path) if matches!(args.command, CliCommand::Settings { .. }) => {
            Settings::load_or_default(Some(path))
                .with_context(|| format!("Failed to load settings from {}", path.display()))
        }
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Settings::load_or_default(None).context("Failed to load settings"),
    }
}

fn settings_path(global: &GlobalOptions) -> Result<PathBuf> {
    match &global.config_path {
        Some(path) => Ok(path.clone()),
        None => Settings::default_path().context("Could not determine the settings file location"),
    }
}

fn edit_settings(
    mut settings: Settings,
    path: &Path,
    lists_path: &Path,
    action: SettingsAction,
) -> Result<()> {
    match action {
        SettingsAction::Show { json } => {
            if json {
                println!("{}", output::format_settings_json(path, &settings, lists_path)?);
            } else {
                print!("{}", output::format_settings_human(path, &settings, lists_path));
            }
            return Ok(());
        }
        SettingsAction::SetInterval(seconds) => settings.monitor.poll_interval = seconds,
        SettingsAction::SetListsPath(lists) => settings.storage.lists_path = Some(lists),
    }

    settings
        .save_to_file(path)
        .with_context(|| format!("Failed to save settings to {}", path.display()))?;
    println!("Saved settings to {}", path.display());
    Ok(())
}

fn resolve_lists_path(args: &CliArgs, settings: &Settings) -> Result<PathBuf> {
    match &args.global.lists_path {
        Some(path) => Ok(path.clone()),
        None => settings
            .lists_path()
            .context("Could not determine where to store the process lists"),
    }
}

/// Open the lists file. A corrupt or unreadable file was already logged by the
/// store and is treated as empty.
fn open_store(path: PathBuf) -> MembershipStore {
    let (store, warning) = MembershipStore::open(path);
    if let Some(err) = warning {
        debug!("Continuing with empty lists: {}", err);
    }
    store
}

fn run_monitor(lists_path: PathBuf, interval: Duration, json: bool, once: bool) -> Result<()> {
    let store = open_store(lists_path).into_shared();
    let (event_tx, event_rx) = channel::unbounded::<TerminationEvent>();

    let printer = thread::spawn(move || {
        for event in event_rx {
            if json {
                match output::format_event_json(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("Could not serialize event: {}", e),
                }
            } else {
                println!("{}", output::format_event_human(&event));
            }
        }
    });

    let monitor = ProcessMonitor::new(store, Arc::new(SystemActuator::new()))
        .with_interval(interval)
        .with_event_sender(event_tx);

    if once {
        monitor.run_once();
    } else {
        // Set up interrupt handling
        let interrupted = Arc::new(AtomicBool::new(false));
        let _ = signal_hook::flag::register(signal_hook::consts::SIGINT, interrupted.clone());
        let _ = signal_hook::flag::register(signal_hook::consts::SIGTERM, interrupted.clone());

        if !json {
            eprintln!(
                "Monitoring every {:.1}s. Press Ctrl+C to stop.",
                interval.as_secs_f64()
            );
        }
        monitor::run_until(&monitor, &interrupted);
    }

    let stats = monitor.stats();
    // Dropping the monitor drops the last event sender and ends the printer
    drop(monitor);
    if printer.join().is_err() {
        warn!("Event printer thread panicked");
    }

    print_summary(&stats, json)
}

fn print_summary(stats: &MonitorStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(stats)?);
    } else {
        println!(
            "Iterations: {}, terminated: {}, vanished: {}, refused: {}",
            stats.iterations, stats.terminated, stats.vanished, stats.refused
        );
        if stats.panics > 0 {
            println!("Failed iterations: {}", stats.panics);
        }
    }
    Ok(())
}
