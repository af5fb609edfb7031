//! systemd user service installation
//!
//! Writes a user-level unit that runs the daemon in the foreground under
//! systemd supervision, so rotation starts with the user session.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Unit file name installed under `~/.config/systemd/user/`.
pub const UNIT_NAME: &str = "vpn-rotator.service";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to write service unit: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Render the unit file contents.
pub fn unit_file(binary: &Path, profile_dir: Option<&Path>) -> String {
    let profile_arg = match profile_dir {
        Some(dir) => format!("--profile-dir {} ", dir.display()),
        None => String::new(),
    };

    format!(
        r"[Unit]
Description=VPN endpoint rotation daemon
After=network-online.target
Wants=network-online.target

[Service]
Type=simple
ExecStart={binary} {profile_arg}start --foreground
Restart=on-failure
RestartSec=5

[Install]
WantedBy=default.target
",
        binary = binary.display(),
        profile_arg = profile_arg,
    )
}

/// Install the user unit and return the path it was written to.
///
/// `profile_dir` is baked into `ExecStart` when the caller overrode the
/// default profile location.
pub fn install(profile_dir: Option<&Path>) -> Result<PathBuf, ServiceError> {
    let binary = std::env::current_exe()?;
    let unit_dir = dirs::home_dir()
        .ok_or(ServiceError::NoHomeDir)?
        .join(".config/systemd/user");
    std::fs::create_dir_all(&unit_dir)?;

    let unit_path = unit_dir.join(UNIT_NAME);
    std::fs::write(&unit_path, unit_file(&binary, profile_dir))?;
    info!("Wrote systemd user unit: {}", unit_path.display());
    Ok(unit_path)
}
