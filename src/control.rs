//! Control channel between CLI invocations and the daemon
//!
//! Short-lived CLI invocations talk to the one running daemon over a
//! Unix socket in the profile directory. The protocol is line-oriented:
//! one newline-terminated request per connection, one newline-terminated
//! reply, then the connection closes. Concurrent senders are serialized
//! by the daemon's single accept loop.
//!
//! Every wait on the client side is bounded, so a missing or wedged
//! daemon is reported instead of hanging the caller.

use crate::state::Group;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::timeout;

/// Bound on establishing the socket connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Bound on waiting for the daemon's reply. Generous because `skip`
/// synchronously drives the external VPN client before replying.
const REPLY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Daemon is not running")]
    DaemonNotRunning,
    #[error("Timed out waiting for the daemon")]
    Timeout,
    #[error("Control channel I/O failed: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid control request: {0}")]
    BadRequest(String),
    #[error("Malformed reply from daemon: {0}")]
    BadReply(String),
}

/// A verb sent to the running daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Stop,
    Pause,
    Resume,
    Skip,
    Status,
    Switch(Group),
    Interval(u64),
}

impl FromStr for Request {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().unwrap_or("");
        let arg = parts.next();

        if parts.next().is_some() {
            return Err(ControlError::BadRequest(s.to_string()));
        }

        match (verb, arg) {
            ("stop", None) => Ok(Request::Stop),
            ("pause", None) => Ok(Request::Pause),
            ("resume", None) => Ok(Request::Resume),
            ("skip", None) => Ok(Request::Skip),
            ("status", None) => Ok(Request::Status),
            ("switch", Some(group)) => group
                .parse()
                .map(Request::Switch)
                .map_err(|_| ControlError::BadRequest(s.to_string())),
            ("interval", Some(minutes)) => minutes
                .parse()
                .map(Request::Interval)
                .map_err(|_| ControlError::BadRequest(s.to_string())),
            _ => Err(ControlError::BadRequest(s.to_string())),
        }
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Stop => write!(f, "stop"),
            Request::Pause => write!(f, "pause"),
            Request::Resume => write!(f, "resume"),
            Request::Skip => write!(f, "skip"),
            Request::Status => write!(f, "status"),
            Request::Switch(group) => write!(f, "switch {}", group),
            Request::Interval(minutes) => write!(f, "interval {}", minutes),
        }
    }
}

/// The daemon's one-line answer to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok(String),
    Err(String),
}

impl Reply {
    pub fn ok(detail: impl Into<String>) -> Self {
        Reply::Ok(detail.into())
    }

    pub fn err(detail: impl Into<String>) -> Self {
        Reply::Err(detail.into())
    }
}

impl FromStr for Reply {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, ControlError> {
        let (tag, detail) = match s.split_once(' ') {
            Some((tag, detail)) => (tag, detail.trim().to_string()),
            None => (s, String::new()),
        };
        match tag {
            "ok" => Ok(Reply::Ok(detail)),
            "err" => Ok(Reply::Err(detail)),
            _ => Err(ControlError::BadReply(s.to_string())),
        }
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Ok(detail) if detail.is_empty() => write!(f, "ok"),
            Reply::Ok(detail) => write!(f, "ok {}", detail),
            Reply::Err(detail) => write!(f, "err {}", detail),
        }
    }
}

/// Send one request to the daemon listening on `socket_path` and wait
/// for its reply.
///
/// A missing socket or a refused connection maps to
/// [`ControlError::DaemonNotRunning`], distinct from an accepted request
/// that times out.
pub async fn send(socket_path: &Path, request: &Request) -> Result<Reply, ControlError> {
    if !socket_path.exists() {
        return Err(ControlError::DaemonNotRunning);
    }

    let stream = match timeout(CONNECT_TIMEOUT, UnixStream::connect(socket_path)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e))
            if matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ) =>
        {
            return Err(ControlError::DaemonNotRunning);
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(ControlError::Timeout),
    };

    let (read_half, mut write_half) = stream.into_split();
    write_half
        .write_all(format!("{}\n", request).as_bytes())
        .await?;

    let mut line = String::new();
    let mut reader = BufReader::new(read_half);
    match timeout(REPLY_TIMEOUT, reader.read_line(&mut line)).await {
        Ok(Ok(0)) => Err(ControlError::BadReply(
            "connection closed before reply".to_string(),
        )),
        Ok(Ok(_)) => line.trim_end().parse(),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ControlError::Timeout),
    }
}
