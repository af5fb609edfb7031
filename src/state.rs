//! Persisted rotation state
//!
//! The rotation state is a small JSON record shared between the daemon
//! and short-lived CLI invocations. Every mutation is a full
//! read-modify-write; writes go through a temp file and an atomic rename
//! so concurrent writers can never leave a torn record on disk.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Hard bounds on the rotation interval, in minutes.
pub const MIN_INTERVAL_MINUTES: u64 = 1;
pub const MAX_INTERVAL_MINUTES: u64 = 1440;

/// Practical floor below which rotation churns the external client.
pub const RECOMMENDED_MIN_INTERVAL_MINUTES: u64 = 5;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read state file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to serialize state: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("Interval must be between 1 and 1440 minutes, got {0}")]
    IntervalOutOfRange(u64),
    #[error("Unknown rotation group: {0} (expected A or B)")]
    UnknownGroup(String),
}

/// One of the two rotation groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

impl Group {
    /// File name of this group's endpoint list within a profile directory.
    pub fn list_file_name(self) -> &'static str {
        match self {
            Group::A => "list_a.txt",
            Group::B => "list_b.txt",
        }
    }
}

impl FromStr for Group {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(Group::A),
            "B" | "b" => Ok(Group::B),
            _ => Err(StateError::UnknownGroup(s.to_string())),
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Group::A => write!(f, "A"),
            Group::B => write!(f, "B"),
        }
    }
}

/// The rotation state record persisted as `state.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationState {
    pub active_group: Group,
    pub interval_minutes: u64,
    pub current_index: usize,
    pub running: bool,
    pub paused: bool,
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            active_group: Group::A,
            interval_minutes: 10,
            current_index: 0,
            running: false,
            paused: false,
        }
    }
}

impl RotationState {
    /// Load the state record, falling back to defaults when the file is
    /// missing or unparseable. A corrupt record is worth a warning but
    /// never a crash; the daemon self-heals it on the next save.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!("State file {} is corrupt ({}), using defaults", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Persist the record atomically: serialize to a temp file in the
    /// same directory, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let content = serde_json::to_string_pretty(self)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.persist(path).map_err(|e| StateError::ReadError(e.error))?;
        Ok(())
    }

    /// Clamp `current_index` into the bounds of a group of `len` entries.
    ///
    /// An empty group pins the index at 0; the daemon holds without a
    /// current endpoint in that case.
    pub fn clamp_index(&mut self, len: usize) {
        if len == 0 {
            self.current_index = 0;
        } else {
            self.current_index %= len;
        }
    }

    /// Validate an interval against the hard bounds, logging a warning
    /// below the recommended floor.
    pub fn validate_interval(minutes: u64) -> Result<u64, StateError> {
        if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
            return Err(StateError::IntervalOutOfRange(minutes));
        }
        if minutes < RECOMMENDED_MIN_INTERVAL_MINUTES {
            warn!(
                "Interval of {} minutes is below the recommended floor of {} minutes",
                minutes, RECOMMENDED_MIN_INTERVAL_MINUTES
            );
        }
        Ok(minutes)
    }
}
