//! CLI argument parsing and validation module
//!
//! Handles command-line interface using clap, including:
//! - Blacklist / whitelist editing
//! - The monitor loop (interval, JSON output, single pass)
//! - One-shot process controls (kill, boost, top processes)
//! - Config / lists path overrides and verbosity

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{anyhow, Result};
use crate::config::validate_interval;
use crate::constants::{APP_NAME, DEFAULT_TOP_PROCESSES};
use crate::models::ListKind;

/// Version string including the git hash injected by build.rs
pub const VERSION: &str = concat!(env!("PROCGUARD_VERSION"), " (", env!("GIT_HASH"), ")");

/// Options accepted by every subcommand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalOptions {
    /// Settings file (defaults to the platform config directory)
    pub config_path: Option<PathBuf>,
    /// Lists file, overrides the settings file
    pub lists_path: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    Add,
    Remove,
}

/// Edits applied to the settings file
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    Show { json: bool },
    /// Seconds, already validated
    SetInterval(f64),
    SetListsPath(PathBuf),
}

/// Parsed subcommand
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Lists {
        json: bool,
    },
    EditList {
        kind: ListKind,
        action: ListAction,
        name: String,
    },
    Monitor {
        /// Overrides the settings file when present
        interval: Option<Duration>,
        json: bool,
        once: bool,
    },
    Processes {
        limit: usize,
        json: bool,
    },
    Kill {
        pid: u32,
    },
    Boost {
        pid: u32,
    },
    BoostWhitelisted,
    Settings {
        action: SettingsAction,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub global: GlobalOptions,
    pub command: CliCommand,
}

fn json_flag() -> Arg {
    Arg::new("json")
        .short('j')
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

fn pid_arg() -> Arg {
    Arg::new("pid")
        .value_name("PID")
        .help("Process ID")
        .required(true)
        .value_parser(value_parser!(u32))
}

fn list_command(kind: ListKind) -> Command {
    let name_arg = || {
        Arg::new("name")
            .value_name("NAME")
            .help("Process name exactly as the OS reports it (e.g. game.exe)")
            .required(true)
    };

    Command::new(kind.as_str())
        .about(match kind {
            ListKind::Blacklist => "Edit the names that are terminated on sight",
            ListKind::Whitelist => "Edit the names exempt from termination",
        })
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("add").about("Add a process name").arg(name_arg()))
        .subcommand(Command::new("remove").about("Remove a process name").arg(name_arg()))
}

/// Build the clap command tree
pub fn build_command() -> Command {
    Command::new(APP_NAME)
        .version(VERSION)
        .about("Terminate blacklisted processes in the background")
        .long_about(
            "A process guard that periodically enumerates running processes and terminates \
             any whose name is on the blacklist, unless the name is also whitelisted.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config_path")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Settings file (TOML)")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("lists_path")
                .short('l')
                .long("lists")
                .value_name("PATH")
                .help("Blacklist/whitelist file (JSON)")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log debug details, including refused terminations")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("lists").about("Show the blacklist and whitelist").arg(json_flag()))
        .subcommand(list_command(ListKind::Blacklist))
        .subcommand(list_command(ListKind::Whitelist))
        .subcommand(
            Command::new("monitor")
                .about("Terminate blacklisted processes until interrupted (Ctrl+C)")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECONDS")
                        .help("Polling interval in seconds (0.1-300.0)")
                        .value_parser(value_parser!(f64)),
                )
                .arg(json_flag())
                .arg(
                    Arg::new("once")
                        .long("once")
                        .help("Run a single iteration and exit")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("processes")
                .about("List the processes using the most memory")
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .value_name("N")
                        .help(format!("Number of processes to show [default: {}]", DEFAULT_TOP_PROCESSES))
                        .value_parser(value_parser!(usize)),
                )
                .arg(json_flag()),
        )
        .subcommand(Command::new("kill").about("Terminate a process").arg(pid_arg()))
        .subcommand(Command::new("boost").about("Raise a process to high priority").arg(pid_arg()))
        .subcommand(
            Command::new("boost-whitelisted")
                .about("Raise every running whitelisted process to high priority"),
        )
        .subcommand(
            Command::new("settings")
                .about("Show or change the settings file")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Show the effective settings").arg(json_flag()))
                .subcommand(
                    Command::new("set-interval")
                        .about("Persist the default polling interval")
                        .arg(
                            Arg::new("seconds")
                                .value_name("SECONDS")
                                .help("Polling interval in seconds (0.1-300.0)")
                                .required(true)
                                .value_parser(value_parser!(f64)),
                        ),
                )
                .subcommand(
                    Command::new("set-lists")
                        .about("Persist the location of the lists file")
                        .arg(
                            Arg::new("path")
                                .value_name("PATH")
                                .help("Blacklist/whitelist file (JSON)")
                                .required(true)
                                .value_parser(value_parser!(PathBuf)),
                        ),
                ),
        )
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    from_matches(&build_command().get_matches())
}

/// Parse an explicit argument list (first item is the binary name)
pub fn parse_from<I, T>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    from_matches(&matches)
}

fn from_matches(matches: &ArgMatches) -> Result<CliArgs> {
    let global = GlobalOptions {
        config_path: matches.get_one::<PathBuf>("config_path").cloned(),
        lists_path: matches.get_one::<PathBuf>("lists_path").cloned(),
        quiet: matches.get_flag("quiet"),
        verbose: matches.get_flag("verbose"),
    };

    let command = match matches.subcommand() {
        Some(("lists", sub)) => CliCommand::Lists {
            json: sub.get_flag("json"),
        },
        Some((list @ ("blacklist" | "whitelist"), sub)) => {
            let kind: ListKind = list.parse().map_err(|e: String| anyhow!(e))?;
            let (action, args) = match sub.subcommand() {
                Some(("add", args)) => (ListAction::Add, args),
                Some(("remove", args)) => (ListAction::Remove, args),
                _ => return Err(anyhow!("Expected 'add' or 'remove'")),
            };
            let name = args
                .get_one::<String>("name")
                .cloned()
                .ok_or_else(|| anyhow!("Missing process name"))?;
            CliCommand::EditList { kind, action, name }
        }
        Some(("monitor", sub)) => {
            let interval = sub
                .get_one::<f64>("interval")
                .map(|secs| validate_interval(*secs))
                .transpose()?;
            CliCommand::Monitor {
                interval,
                json: sub.get_flag("json"),
                once: sub.get_flag("once"),
            }
        }
        Some(("processes", sub)) => CliCommand::Processes {
            limit: sub
                .get_one::<usize>("limit")
                .copied()
                .unwrap_or(DEFAULT_TOP_PROCESSES),
            json: sub.get_flag("json"),
        },
        Some(("kill", sub)) => CliCommand::Kill { pid: required_pid(sub)? },
        Some(("boost", sub)) => CliCommand::Boost { pid: required_pid(sub)? },
        Some(("boost-whitelisted", _)) => CliCommand::BoostWhitelisted,
        Some(("settings", sub)) => CliCommand::Settings {
            action: settings_action(sub)?,
        },
        _ => return Err(anyhow!("No subcommand given")),
    };

    Ok(CliArgs { global, command })
}

fn settings_action(matches: &ArgMatches) -> Result<SettingsAction> {
    match matches.subcommand() {
        Some(("show", sub)) => Ok(SettingsAction::Show {
            json: sub.get_flag("json"),
        }),
        Some(("set-interval", sub)) => {
            let seconds = sub
                .get_one::<f64>("seconds")
                .copied()
                .ok_or_else(|| anyhow!("Missing interval"))?;
            validate_interval(seconds)?;
            Ok(SettingsAction::SetInterval(seconds))
        }
        Some(("set-lists", sub)) => sub
            .get_one::<PathBuf>("path")
            .cloned()
            .map(SettingsAction::SetListsPath)
            .ok_or_else(|| anyhow!("Missing lists path")),
        _ => Err(anyhow!("Expected 'show', 'set-interval' or 'set-lists'")),
    }
}

fn required_pid(matches: &ArgMatches) -> Result<u32> {
    matches
        .get_one::<u32>("pid")
        .copied()
        .ok_or_else(|| anyhow!("Missing PID"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_tree_is_consistent() {
        build_command().debug_assert();
    }

    #[test]
    fn test_blacklist_add() {
        let args = parse_from(["procguard", "blacklist", "add", "bad.exe"]).unwrap();
        assert_eq!(
            args.command,
            CliCommand::EditList {
                kind: ListKind::Blacklist,
                action: ListAction::Add,
                name: "bad.exe".to_string(),
            }
        );
    }

    #[test]
    fn test_whitelist_remove_with_global_lists_path() {
        let args = parse_from([
            "procguard",
            "whitelist",
            "remove",
            "keep.exe",
            "--lists",
            "/tmp/lists.json",
        ])
        .unwrap();
        assert_eq!(args.global.lists_path, Some(PathBuf::from("/tmp/lists.json")));
        assert!(matches!(
            args.command,
            CliCommand::EditList { kind: ListKind::Whitelist, action: ListAction::Remove, .. }
        ));
    }

    #[test]
    fn test_monitor_defaults() {
        let args = parse_from(["procguard", "monitor"]).unwrap();
        assert_eq!(
            args.command,
            CliCommand::Monitor { interval: None, json: false, once: false }
        );
    }

    #[test]
    fn test_monitor_interval_validated() {
        let args = parse_from(["procguard", "monitor", "--interval", "0.5", "--once"]).unwrap();
        assert_eq!(
            args.command,
            CliCommand::Monitor {
                interval: Some(Duration::from_millis(500)),
                json: false,
                once: true,
            }
        );

        let err = parse_from(["procguard", "monitor", "--interval", "0.01"]).unwrap_err();
        assert!(err.to_string().contains("Invalid polling interval"));
    }

    #[test]
    fn test_processes_default_limit() {
        let args = parse_from(["procguard", "processes"]).unwrap();
        assert_eq!(args.command, CliCommand::Processes { limit: 10, json: false });
    }

    #[test]
    fn test_kill_requires_numeric_pid() {
        assert!(parse_from(["procguard", "kill", "abc"]).is_err());
        let args = parse_from(["procguard", "kill", "1234"]).unwrap();
        assert_eq!(args.command, CliCommand::Kill { pid: 1234 });
    }

    #[test]
    fn test_global_flags() {
        let args = parse_from(["procguard", "-q", "boost-whitelisted"]).unwrap();
        assert!(args.global.quiet);
        assert!(!args.global.verbose);
        assert_eq!(args.command, CliCommand::BoostWhitelisted);
    }

    #[test]
    fn test_processes_explicit_limit() {
        let args = parse_from(["procguard", "processes", "-n", "3", "--json"]).unwrap();
        assert_eq!(args.command, CliCommand::Processes { limit: 3, json: true });
    }

    #[test]
    fn test_settings_subcommands() {
        let args = parse_from(["procguard", "settings", "set-interval", "1.5"]).unwrap();
        assert_eq!(
            args.command,
            CliCommand::Settings { action: SettingsAction::SetInterval(1.5) }
        );

        let args = parse_from(["procguard", "settings", "set-lists", "/tmp/l.json"]).unwrap();
        assert_eq!(
            args.command,
            CliCommand::Settings {
                action: SettingsAction::SetListsPath(PathBuf::from("/tmp/l.json"))
            }
        );

        let err = parse_from(["procguard", "settings", "set-interval", "500"]).unwrap_err();
        assert!(err.to_string().contains("Invalid polling interval"));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(parse_from(["procguard"]).is_err());
        assert!(parse_from(["procguard", "blacklist"]).is_err());
    }
}
