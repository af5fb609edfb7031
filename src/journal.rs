//! Append-only log of daemon actions
//!
//! One line per action the daemon takes against the external VPN
//! client: timestamp, action, endpoint and result. Separate from the
//! tracing output so the rotation history survives log-level filtering.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

/// Writer for the profile's `rotation.log`.
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one action line. Journal failures are logged and swallowed;
    /// a full disk must not stop the rotation loop.
    pub fn record(&self, action: &str, endpoint: Option<&str>, result: &str) {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown-time".to_string());

        let line = match endpoint {
            Some(endpoint) => format!(
                "{} action={} endpoint={} result={}\n",
                timestamp, action, endpoint, result
            ),
            None => format!("{} action={} result={}\n", timestamp, action, result),
        };

        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = appended {
            warn!("Failed to append to journal {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_appends_lines() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::new(dir.path().join("rotation.log"));

        journal.record("connect", Some("US-FREE#1"), "ok");
        journal.record("disconnect", None, "ok");

        let content = std::fs::read_to_string(dir.path().join("rotation.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("action=connect"));
        assert!(lines[0].contains("endpoint=US-FREE#1"));
        assert!(lines[0].contains("result=ok"));
        assert!(lines[1].contains("action=disconnect"));
        assert!(!lines[1].contains("endpoint="));
    }

    #[test]
    fn test_record_lines_are_timestamped() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::new(dir.path().join("rotation.log"));

        journal.record("connect", Some("CA#5"), "err connection refused");

        let content = std::fs::read_to_string(dir.path().join("rotation.log")).unwrap();
        // RFC 3339 timestamps start the line, e.g. 2026-08-05T12:00:00Z
        let timestamp = content.split_whitespace().next().unwrap();
        assert!(timestamp.contains('T'));
        assert!(OffsetDateTime::parse(timestamp, &Rfc3339).is_ok());
    }
}
