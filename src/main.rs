//! Command-line front end
//!
//! Each invocation either operates on the profile's stores directly
//! (list edits, settings changes while no daemon runs) or sends a verb
//! to the running daemon over the control socket.
//!
//! # Exit codes
//!
//! | code | meaning |
//! |------|---------|
//! | 0    | success |
//! | 1    | operation failed |
//! | 2    | invalid argument |
//! | 3    | daemon not running |
//! | 4    | external VPN client failure |
//! | 5    | daemon already running |

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;
use vpn_rotator::connector::{CommandVpnClient, DEFAULT_CLIENT_PROGRAM};
use vpn_rotator::control::{self, ControlError, Reply, Request};
use vpn_rotator::daemon::{DaemonError, RotationDaemon};
use vpn_rotator::lists::ListStore;
use vpn_rotator::profile::Profile;
use vpn_rotator::service;
use vpn_rotator::state::{Group, RotationState};

const EXIT_FAILURE: i32 = 1;
const EXIT_INVALID_ARGUMENT: i32 = 2;
const EXIT_DAEMON_NOT_RUNNING: i32 = 3;
const EXIT_CLIENT_FAILURE: i32 = 4;
const EXIT_ALREADY_RUNNING: i32 = 5;

#[derive(Parser)]
#[command(name = "vpn-rotator")]
#[command(about = "Timed VPN endpoint rotation with two switchable lists")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Profile directory (defaults to the per-user config location)
    #[arg(long, global = true, value_name = "DIR")]
    profile_dir: Option<PathBuf>,

    /// External VPN client command
    #[arg(long, global = true, value_name = "PROGRAM", default_value = DEFAULT_CLIENT_PROGRAM)]
    client: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the rotation daemon
    Start {
        /// Run in the foreground instead of spawning a background daemon
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the running daemon and disconnect
    Stop,
    /// Suspend rotation, leaving the current connection up
    Pause,
    /// Resume rotation with a full interval
    Resume,
    /// Rotate to the next endpoint immediately
    Skip,
    /// Show rotation status
    Status,
    /// Switch the active rotation group
    Switch { group: Group },
    /// Set the rotation interval in minutes
    Interval { minutes: u64 },
    /// Show the endpoints of a group
    List { group: Group },
    /// Show the endpoints of a group containing a pattern
    Search { group: Group, pattern: String },
    /// Append an endpoint to a group
    Add { group: Group, endpoint: String },
    /// Remove the first exact match of an endpoint from a group
    Remove { group: Group, endpoint: String },
    /// Replace a substring in every endpoint of a group
    Replace {
        group: Group,
        find: String,
        replacement: String,
    },
    /// Install a systemd user service for autostart
    InstallService,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to initialize logging");
    }

    let Some(profile_dir) = cli.profile_dir.clone().or_else(Profile::default_dir) else {
        eprintln!("Cannot determine a profile directory; pass --profile-dir");
        std::process::exit(EXIT_FAILURE);
    };
    let profile = Profile::new(&profile_dir);

    // Unrecoverable failure to create the profile directory is the one
    // fatal startup error
    if let Err(e) = profile.init() {
        eprintln!("Failed to prepare profile {}: {}", profile_dir.display(), e);
        std::process::exit(EXIT_FAILURE);
    }

    std::process::exit(dispatch(cli, profile).await);
}

async fn dispatch(cli: Cli, profile: Profile) -> i32 {
    let store = ListStore::new(profile.dir());

    match cli.command {
        Commands::Start { foreground } => {
            if let Some(pid) = profile.live_daemon_pid() {
                eprintln!("Daemon already running (PID {})", pid);
                return EXIT_ALREADY_RUNNING;
            }
            if foreground {
                run_daemon(profile, &cli.client).await
            } else {
                spawn_background(&profile)
            }
        }

        Commands::Stop => send_control(&profile, Request::Stop).await,
        Commands::Pause => send_control(&profile, Request::Pause).await,
        Commands::Resume => send_control(&profile, Request::Resume).await,
        Commands::Skip => send_control(&profile, Request::Skip).await,

        Commands::Status => match control::send(&profile.socket_path(), &Request::Status).await {
            Ok(Reply::Ok(line)) => {
                println!("{}", line);
                0
            }
            Ok(Reply::Err(detail)) => {
                eprintln!("{}", detail);
                EXIT_FAILURE
            }
            Err(ControlError::DaemonNotRunning) => match offline_status(&profile) {
                Ok(line) => {
                    println!("{}", line);
                    0
                }
                Err(e) => {
                    eprintln!("{}", e);
                    EXIT_FAILURE
                }
            },
            Err(e) => {
                eprintln!("{}", e);
                EXIT_FAILURE
            }
        },

        Commands::Switch { group } => {
            if profile.live_daemon_pid().is_some() {
                send_control(&profile, Request::Switch(group)).await
            } else {
                match switch_offline(&profile, group) {
                    Ok(()) => {
                        println!("Switched to group {}", group);
                        0
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        EXIT_FAILURE
                    }
                }
            }
        }

        Commands::Interval { minutes } => {
            // Validate before touching the store or the daemon
            if let Err(e) = RotationState::validate_interval(minutes) {
                eprintln!("{}", e);
                return EXIT_INVALID_ARGUMENT;
            }
            if profile.live_daemon_pid().is_some() {
                send_control(&profile, Request::Interval(minutes)).await
            } else {
                match interval_offline(&profile, minutes) {
                    Ok(()) => {
                        println!("Interval set to {} minutes", minutes);
                        0
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        EXIT_FAILURE
                    }
                }
            }
        }

        Commands::List { group } => match store.load(group) {
            Ok(endpoints) => {
                println!("List {} ({} endpoints):", group, endpoints.len());
                for (i, endpoint) in endpoints.iter().enumerate() {
                    println!("  {}. {}", i + 1, endpoint);
                }
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                EXIT_FAILURE
            }
        },

        Commands::Search { group, pattern } => match store.search(group, &pattern) {
            Ok(matches) => {
                println!("Found {} matches:", matches.len());
                for endpoint in matches {
                    println!("  {}", endpoint);
                }
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                EXIT_FAILURE
            }
        },

        Commands::Add { group, endpoint } => match store.add(group, &endpoint) {
            Ok(()) => {
                println!("Added '{}' to list {}", endpoint, group);
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                EXIT_FAILURE
            }
        },

        Commands::Remove { group, endpoint } => match store.remove(group, &endpoint) {
            Ok(()) => {
                println!("Removed '{}' from list {}", endpoint, group);
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                EXIT_FAILURE
            }
        },

        Commands::Replace {
            group,
            find,
            replacement,
        } => match store.replace(group, &find, &replacement) {
            Ok(changed) => {
                println!("Changed {} endpoint(s) in list {}", changed, group);
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                EXIT_FAILURE
            }
        },

        Commands::InstallService => match service::install(cli.profile_dir.as_deref()) {
            Ok(path) => {
                println!("Systemd service file created at {}", path.display());
                println!("To enable autostart on boot, run:");
                println!("  systemctl --user enable {}", service::UNIT_NAME);
                println!("To start now:");
                println!("  systemctl --user start {}", service::UNIT_NAME);
                0
            }
            Err(e) => {
                eprintln!("{}", e);
                EXIT_FAILURE
            }
        },
    }
}

/// Run the daemon loop in this process.
async fn run_daemon(profile: Profile, client_program: &str) -> i32 {
    let client = CommandVpnClient::with_program(client_program);
    let mut daemon = match RotationDaemon::new(profile, Box::new(client)) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Failed to initialize daemon: {}", e);
            return EXIT_FAILURE;
        }
    };

    match daemon.run().await {
        Ok(()) => 0,
        Err(DaemonError::AlreadyRunning(pid)) => {
            eprintln!("Daemon already running (PID {})", pid);
            EXIT_ALREADY_RUNNING
        }
        Err(e) => {
            error!("Daemon failed: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Re-exec ourselves as a background daemon with stderr captured in the
/// profile's daemon log.
fn spawn_background(profile: &Profile) -> i32 {
    let log = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(profile.daemon_log_path())
    {
        Ok(log) => log,
        Err(e) => {
            eprintln!("Failed to open daemon log: {}", e);
            return EXIT_FAILURE;
        }
    };

    let current_exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            eprintln!("Failed to resolve current executable: {}", e);
            return EXIT_FAILURE;
        }
    };

    let mut args: Vec<OsString> = std::env::args_os().skip(1).collect();
    args.push(OsString::from("--foreground"));

    match std::process::Command::new(current_exe)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(log))
        .spawn()
    {
        Ok(child) => {
            println!("Rotation daemon started (PID {})", child.id());
            println!("  Profile: {}", profile.dir().display());
            println!("  Log:     {}", profile.daemon_log_path().display());
            0
        }
        Err(e) => {
            eprintln!("Failed to launch daemon: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Send a verb to the running daemon and report its reply.
async fn send_control(profile: &Profile, request: Request) -> i32 {
    match control::send(&profile.socket_path(), &request).await {
        Ok(Reply::Ok(detail)) => {
            if detail.is_empty() {
                println!("ok");
            } else {
                println!("{}", detail);
            }
            0
        }
        Ok(Reply::Err(detail)) => {
            eprintln!("{}", detail);
            if detail.starts_with("failed to connect") {
                EXIT_CLIENT_FAILURE
            } else {
                EXIT_FAILURE
            }
        }
        Err(ControlError::DaemonNotRunning) => {
            eprintln!("Daemon is not running");
            EXIT_DAEMON_NOT_RUNNING
        }
        Err(e) => {
            eprintln!("{}", e);
            EXIT_FAILURE
        }
    }
}

/// Status from the persisted state when no daemon is listening.
fn offline_status(profile: &Profile) -> Result<String, Box<dyn std::error::Error>> {
    let mut state = RotationState::load(&profile.state_path())?;
    let len = ListStore::new(profile.dir()).load(state.active_group)?.len();
    state.clamp_index(len);
    Ok(format!(
        "STOPPED list={} interval={}m index={}/{}",
        state.active_group, state.interval_minutes, state.current_index, len
    ))
}

fn switch_offline(profile: &Profile, group: Group) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = RotationState::load(&profile.state_path())?;
    state.active_group = group;
    state.current_index = 0;
    state.save(&profile.state_path())?;
    Ok(())
}

fn interval_offline(profile: &Profile, minutes: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = RotationState::load(&profile.state_path())?;
    state.interval_minutes = minutes;
    state.save(&profile.state_path())?;
    Ok(())
}
