//! External VPN client boundary
//!
//! The actual connect/disconnect work is delegated to an external,
//! pre-authenticated VPN client command. The connector classifies the
//! result purely by exit status and never retries; retry policy belongs
//! to the rotation daemon.

use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Default external client, invoked as
/// `protonvpn connect <endpoint>` / `protonvpn disconnect`.
pub const DEFAULT_CLIENT_PROGRAM: &str = "protonvpn";

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Failed to run VPN client '{program}': {source}")]
    SpawnError {
        program: String,
        source: std::io::Error,
    },
    #[error("VPN client failed to {action}: {detail}")]
    ClientFailed { action: String, detail: String },
}

/// Boundary over the external VPN client's connect/disconnect actions.
pub trait VpnClient: Send {
    fn connect(&self, endpoint: &str) -> Result<(), ConnectorError>;
    fn disconnect(&self) -> Result<(), ConnectorError>;
}

/// `VpnClient` that shells out to an external command.
pub struct CommandVpnClient {
    program: String,
}

impl CommandVpnClient {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_CLIENT_PROGRAM)
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str], action: &str) -> Result<(), ConnectorError> {
        debug!("Running {} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| ConnectorError::SpawnError {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                output.status.to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ConnectorError::ClientFailed {
                action: action.to_string(),
                detail,
            });
        }

        Ok(())
    }
}

impl Default for CommandVpnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl VpnClient for CommandVpnClient {
    fn connect(&self, endpoint: &str) -> Result<(), ConnectorError> {
        self.run(&["connect", endpoint], &format!("connect to {}", endpoint))
    }

    fn disconnect(&self) -> Result<(), ConnectorError> {
        self.run(&["disconnect"], "disconnect")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_command_is_success() {
        // `true` ignores its arguments and exits 0
        let client = CommandVpnClient::with_program("true");
        assert!(client.connect("US-FREE#1").is_ok());
        assert!(client.disconnect().is_ok());
    }

    #[test]
    fn test_failing_command_is_client_failure() {
        let client = CommandVpnClient::with_program("false");
        let result = client.connect("US-FREE#1");
        assert!(matches!(result, Err(ConnectorError::ClientFailed { .. })));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("connect to US-FREE#1"));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let client = CommandVpnClient::with_program("vpn-client-that-does-not-exist-12345");
        let result = client.disconnect();
        assert!(matches!(result, Err(ConnectorError::SpawnError { .. })));
    }

    #[test]
    fn test_default_program() {
        let client = CommandVpnClient::new();
        assert_eq!(client.program, DEFAULT_CLIENT_PROGRAM);
    }
}
