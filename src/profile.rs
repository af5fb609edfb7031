//! Profile directory layout and daemon mutual exclusion
//!
//! Everything the daemon and the CLI share lives in one profile
//! directory: the state record, the two list files, the control socket,
//! the PID file and the logs. Multiple simultaneous profiles are
//! supported by pointing invocations at different directories.

use crate::state::RotationState;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Example endpoints seeded into a fresh profile.
const DEFAULT_LIST_A: &str = "US-FREE#1\nCA#5\nNL-FREE#1\n";
const DEFAULT_LIST_B: &str = "JP#3\nSG#5\nHK#2\n";

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to prepare profile directory: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to seed profile state: {0}")]
    StateError(#[from] crate::state::StateError),
}

/// A rotation profile directory.
#[derive(Debug, Clone)]
pub struct Profile {
    dir: PathBuf,
}

impl Profile {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Per-user default profile location, e.g.
    /// `~/.config/vpn-rotator` on Linux.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vpn-rotator"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join("state.json")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.dir.join("control.sock")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dir.join("daemon.pid")
    }

    /// Append-only journal of daemon actions.
    pub fn journal_path(&self) -> PathBuf {
        self.dir.join("rotation.log")
    }

    /// Captured stderr of a background-spawned daemon.
    pub fn daemon_log_path(&self) -> PathBuf {
        self.dir.join("daemon.log")
    }

    /// Create the profile directory and seed any missing pieces with
    /// defaults: the state record and the two example lists. Existing
    /// files are never touched.
    pub fn init(&self) -> Result<(), ProfileError> {
        std::fs::create_dir_all(&self.dir)?;

        let state_path = self.state_path();
        if !state_path.exists() {
            RotationState::default().save(&state_path)?;
        }

        for (file, content) in [("list_a.txt", DEFAULT_LIST_A), ("list_b.txt", DEFAULT_LIST_B)] {
            let path = self.dir.join(file);
            if !path.exists() {
                std::fs::write(&path, content)?;
            }
        }

        Ok(())
    }

    /// Record the current process as the daemon for this profile.
    pub fn write_pid(&self) -> Result<(), ProfileError> {
        std::fs::write(self.pid_path(), format!("{}\n", std::process::id()))?;
        Ok(())
    }

    pub fn remove_pid(&self) {
        let _ = std::fs::remove_file(self.pid_path());
    }

    /// PID of the live daemon owning this profile, if any. A PID file
    /// pointing at a dead or unparseable process is removed as stale.
    pub fn live_daemon_pid(&self) -> Option<i32> {
        let pid_path = self.pid_path();
        let content = std::fs::read_to_string(&pid_path).ok()?;

        let pid = match content.trim().parse::<i32>() {
            Ok(pid) if pid > 0 => pid,
            _ => {
                warn!("Invalid PID file, removing {}", pid_path.display());
                let _ = std::fs::remove_file(&pid_path);
                return None;
            }
        };

        if process_is_running(pid) {
            Some(pid)
        } else {
            warn!("Removing stale PID file for PID {}", pid);
            let _ = std::fs::remove_file(&pid_path);
            None
        }
    }
}

/// Probe process liveness with a null signal. EPERM means the process
/// exists but belongs to someone else, which still counts as running.
#[cfg(unix)]
fn process_is_running(pid: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}
