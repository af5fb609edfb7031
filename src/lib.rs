//! VPN Rotator - Timed VPN endpoint rotation daemon with CLI control
//!
//! This crate rotates a machine's VPN connection through one of two
//! user-maintained endpoint lists on a timer. The actual connect and
//! disconnect actions are delegated to an external, pre-authenticated
//! VPN client command; this crate owns the rotation schedule, the lists,
//! and the control surface.
//!
//! # Architecture
//!
//! - `profile`: Profile directory layout, first-run defaults, PID file
//! - `state`: Persisted rotation state (active group, interval, index)
//! - `lists`: Rotation group list store (line-delimited endpoint files)
//! - `connector`: External VPN client boundary
//! - `control`: Control channel between CLI invocations and the daemon
//! - `daemon`: Rotation state machine and timer loop
//! - `journal`: Append-only log of daemon actions
//! - `service`: systemd user service installation
//!
//! # Usage
//!
//! ```bash
//! vpn-rotator start          # launch the rotation daemon
//! vpn-rotator skip           # rotate to the next endpoint now
//! vpn-rotator switch B       # rotate from list B from now on
//! ```
//!
//! The daemon and the short-lived CLI invocations share nothing but the
//! profile directory on disk and a Unix socket; this crate is Unix-only.

pub mod connector;
pub mod control;
pub mod daemon;
pub mod journal;
pub mod lists;
pub mod profile;
pub mod service;
pub mod state;

pub use connector::{CommandVpnClient, VpnClient};
pub use daemon::RotationDaemon;
pub use profile::Profile;
pub use state::{Group, RotationState};
